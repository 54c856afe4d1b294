//! Layer resolution — surfaces and the element colors that sit on them.
//!
//! Every layer of a mode (`layer-0` … `layer-N`, then the named
//! alternatives) binds a surface. From the surface color the resolver
//! derives:
//!
//! | Element                           | Anchor                     | Against  | Opacity  |
//! |-----------------------------------|----------------------------|----------|----------|
//! | `text`                            | the surface's on-tone      | surface  | emphasis |
//! | `interactive-<state>-tone`        | core `interactive.<state>` | surface  | 1        |
//! | `interactive-<state>-on-tone`     | black or white             | the tone | 1        |
//! | `alert-text`, `warning-text`, …   | the core status color      | surface  | emphasis |
//!
//! Each element starts at its anchor's level and steps along the anchor's
//! own ramp until it reaches AA (see [`crate::step`]). Elements are
//! independent: one that can't be derived is reported and skipped while
//! the rest are still written.
//!
//! A surface whose binding doesn't resolve falls back to the core white
//! (light) or core black (dark) anchor and is reported.

use std::collections::BTreeMap;

use n_color::Color;
use n_token::{
    BrandRef, CoreColor, Document, InteractiveState, LayerId, Level, Mode, Opacity, PropertyName,
    PropertyValue, Reference, Resolver, Subsystem, TokenPath, TokenValue,
};

use crate::anchor::{Anchor, CoreColors, CoreSlot};
use crate::issue::{ComplianceIssue, IssueKind};
use crate::map::{Binding, Derivation, PropertyMap};
use crate::palette::Palette;
use crate::step::{Step, step_until_compliant};

// ---------------------------------------------------------------------------
// Emphasis
// ---------------------------------------------------------------------------

/// The text emphasis opacity: a unit-less token in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Emphasis {
    pub token: TokenPath,
    pub opacity: f64,
}

impl Emphasis {
    /// Resolve `configured` if given, otherwise the theme's
    /// `text-emphasis` binding. `None` means full opacity.
    pub fn resolve(
        resolver: &Resolver<'_>,
        configured: Option<&str>,
        issues: &mut Vec<ComplianceIssue>,
    ) -> Option<Self> {
        let mode = resolver.mode();
        let theme_path = ["themes", mode.as_str(), "text-emphasis"];
        let (text, locus) = match configured {
            Some(text) => (text, "options.text-emphasis".to_string()),
            None => (resolver.theme().leaf_str(&theme_path)?, theme_path.join(".")),
        };

        let failure = match resolver.resolve_token(&Reference::parse(text)) {
            Ok(token) => match resolver.index().get(&token) {
                Some(TokenValue::Number(n)) if (0.0..=1.0).contains(n) => {
                    return Some(Self {
                        opacity: *n,
                        token,
                    });
                }
                _ => format!("{token} is not an opacity in [0, 1]"),
            },
            Err(err) => err.to_string(),
        };
        tracing::warn!(%mode, %failure, "text emphasis unresolved; using full opacity");
        issues.push(ComplianceIssue::warning(
            IssueKind::Reference,
            locus,
            format!("{failure}; text uses full opacity"),
        ));
        None
    }

    #[must_use]
    pub fn property(&self) -> PropertyName {
        PropertyName::token(&self.token)
    }
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Layers declared for `mode`: indexed layers by number, then alternatives
/// in document order.
#[must_use]
pub fn layer_ids(theme: &Document, mode: Mode) -> Vec<LayerId> {
    let base = ["themes", mode.as_str(), "layers"];
    let mut indexed = Vec::new();
    let mut alternatives = Vec::new();
    for key in theme.keys(&base) {
        if key == "alternative" {
            alternatives.extend(
                theme
                    .keys(&["themes", mode.as_str(), "layers", "alternative"])
                    .into_iter()
                    .map(LayerId::Alternative),
            );
        } else if let Some(id) = LayerId::parse_indexed(&key) {
            indexed.push(id);
        } else {
            tracing::debug!(%mode, key, "ignoring unrecognized layer key");
        }
    }
    indexed.sort();
    indexed.extend(alternatives);
    indexed
}

/// `--brand-<mode>-layer-<layer segments>-<tail…>`.
#[must_use]
pub fn element_property(mode: Mode, layer: &LayerId, tail: &[&str]) -> PropertyName {
    let mut path = layer.name_segments();
    path.extend(tail.iter().map(|s| (*s).to_string()));
    PropertyName::brand(mode, Subsystem::Layer, &path)
}

/// Theme-document path of a layer's surface binding.
#[must_use]
pub fn surface_doc_path(mode: Mode, layer: &LayerId) -> Vec<String> {
    let mut path = vec!["themes".to_string(), mode.to_string(), "layers".to_string()];
    path.extend(layer.doc_path());
    path.push("surface".to_string());
    path
}

/// Something a foreground has to read on.
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    /// Brand property holding the background.
    pub name: PropertyName,
    pub token: TokenPath,
    pub color: Color,
}

/// A resolved layer surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub layer: LayerId,
    pub backdrop: Backdrop,
    /// Palette key and level, when the surface is bound to a palette tone.
    pub palette: Option<(String, Level)>,
    /// Whether the binding failed and the core fallback was used.
    pub fallback: bool,
}

/// Everything layer resolution reads.
#[derive(Debug, Clone, Copy)]
pub struct LayerInputs<'a> {
    pub resolver: &'a Resolver<'a>,
    pub cores: &'a CoreColors,
    pub palettes: &'a BTreeMap<String, Palette>,
    pub emphasis: Option<&'a Emphasis>,
}

/// Resolve and emit every layer of the resolver's mode.
pub fn resolve_layers(
    inputs: &LayerInputs<'_>,
    map: &mut PropertyMap,
    issues: &mut Vec<ComplianceIssue>,
) -> Vec<Surface> {
    let mode = inputs.resolver.mode();
    let mut surfaces = Vec::new();
    for layer in layer_ids(inputs.resolver.theme(), mode) {
        let Some(surface) = inputs.surface(&layer, map, issues) else { continue };
        inputs.text(&surface, map, issues);
        for state in InteractiveState::ALL {
            inputs.interactive(&surface, state, map, issues);
        }
        for color in CoreColor::STATUS {
            inputs.status(&surface, color, map, issues);
        }
        tracing::debug!(%mode, %layer, surface = %surface.backdrop.token, "layer resolved");
        surfaces.push(surface);
    }
    surfaces
}

impl LayerInputs<'_> {
    const fn mode(&self) -> Mode {
        self.resolver.mode()
    }

    fn surface(
        &self,
        layer: &LayerId,
        map: &mut PropertyMap,
        issues: &mut Vec<ComplianceIssue>,
    ) -> Option<Surface> {
        let mode = self.mode();
        let doc_path = surface_doc_path(mode, layer);
        let segments: Vec<&str> = doc_path.iter().map(String::as_str).collect();
        let name = element_property(mode, layer, &["surface"]);
        let reference = self.resolver.theme().leaf_str(&segments).map(Reference::parse);

        let resolved = match &reference {
            None => Err("no surface binding".to_string()),
            Some(reference) => match self.resolver.resolve_token(reference) {
                Ok(token) => match self.resolver.index().color(&token) {
                    Some(color) => Ok((token, color)),
                    None => Err(format!("{token} is not a color")),
                },
                Err(err) => Err(err.to_string()),
            },
        };

        let surface = match resolved {
            Ok((token, color)) => {
                let palette = reference.as_ref().and_then(|r| self.palette_source(r));
                let input = match &palette {
                    Some((key, level)) => Palette::tone_property(mode, key, Some(*level)),
                    None => PropertyName::token(&token),
                };
                map.derive(
                    name.clone(),
                    PropertyValue::Ref(PropertyName::token(&token)),
                    Derivation::from_inputs([input]),
                );
                Surface {
                    layer: layer.clone(),
                    backdrop: Backdrop { name, token, color },
                    palette,
                    fallback: false,
                }
            }
            Err(failure) => {
                let slot = match mode {
                    Mode::Light => CoreSlot::WHITE,
                    Mode::Dark => CoreSlot::BLACK,
                };
                let locus = doc_path.join(".");
                tracing::warn!(%mode, %layer, %failure, "surface unresolved");
                let Some(anchor) = self.cores.get(slot) else {
                    issues.push(ComplianceIssue::warning(
                        IssueKind::Reference,
                        locus,
                        format!("{failure}; core {} unresolved, layer skipped", slot.color),
                    ));
                    return None;
                };
                issues.push(ComplianceIssue::warning(
                    IssueKind::Reference,
                    locus,
                    format!("{failure}; using core {}", slot.color),
                ));
                map.derive(
                    name.clone(),
                    PropertyValue::Ref(anchor.property()),
                    Derivation::from_inputs([slot.property(mode)]),
                );
                Surface {
                    layer: layer.clone(),
                    backdrop: Backdrop {
                        name,
                        token: anchor.token.clone(),
                        color: anchor.color,
                    },
                    palette: None,
                    fallback: true,
                }
            }
        };
        map.bind(surface.backdrop.name.clone(), Binding::Theme(doc_path));
        Some(surface)
    }

    /// Palette key and level of a surface bound directly to a palette tone.
    fn palette_source(&self, reference: &Reference) -> Option<(String, Level)> {
        let Reference::Brand(BrandRef::Palette { mode, key, level }) = reference else {
            return None;
        };
        if mode.is_some_and(|m| m != self.mode()) {
            return None;
        }
        let palette = self.palettes.get(key)?;
        let level = level.or(palette.primary)?;
        palette.level(level).map(|_| (key.clone(), level))
    }

    fn text(&self, surface: &Surface, map: &mut PropertyMap, issues: &mut Vec<ComplianceIssue>) {
        let mode = self.mode();
        let name = element_property(mode, &surface.layer, &["text"]);
        let mut derivation =
            Derivation::from_inputs(self.cores.contrast_inputs()).against(surface.backdrop.name.clone());

        let from_palette = surface.palette.as_ref().and_then(|(key, level)| {
            let on_tone = self.palettes.get(key)?.level(*level)?.on_tone.as_ref()?;
            Some((Palette::on_tone_property(mode, key, Some(*level)), on_tone.anchor.clone()))
        });
        let anchor = match from_palette {
            Some((on_tone_name, anchor)) => {
                derivation.inputs.insert(on_tone_name);
                anchor
            }
            None => match self.cores.better_anchor(surface.backdrop.color) {
                Some((_, anchor)) => anchor.clone(),
                None => {
                    issues.push(ComplianceIssue::warning(
                        IssueKind::Reference,
                        name.as_str(),
                        "core black/white unresolved; text skipped",
                    ));
                    return;
                }
            },
        };
        self.foreground(name, &anchor, &surface.backdrop, true, derivation, map, issues);
    }

    fn interactive(
        &self,
        surface: &Surface,
        state: InteractiveState,
        map: &mut PropertyMap,
        issues: &mut Vec<ComplianceIssue>,
    ) {
        let mode = self.mode();
        let slot = CoreSlot::interactive(state);
        let Some(anchor) = self.cores.get(slot) else {
            tracing::debug!(%mode, layer = %surface.layer, state = state.as_str(), "no interactive anchor");
            return;
        };

        let tone_name = element_property(mode, &surface.layer, &["interactive", state.as_str(), "tone"]);
        let derivation = Derivation::from_inputs([slot.property(mode)]).against(surface.backdrop.name.clone());
        let Some(tone) = self.foreground(
            tone_name.clone(),
            anchor,
            &surface.backdrop,
            false,
            derivation,
            map,
            issues,
        ) else {
            return;
        };

        let Some((_, on_anchor)) = self.cores.better_anchor(tone.color) else { return };
        let backdrop = Backdrop {
            name: tone_name.clone(),
            token: TokenPath::color(&anchor.token.key, tone.level),
            color: tone.color,
        };
        let on_name = element_property(mode, &surface.layer, &["interactive", state.as_str(), "on-tone"]);
        let derivation = Derivation::from_inputs(self.cores.contrast_inputs()).against(tone_name);
        self.foreground(on_name, on_anchor, &backdrop, false, derivation, map, issues);
    }

    fn status(
        &self,
        surface: &Surface,
        color: CoreColor,
        map: &mut PropertyMap,
        issues: &mut Vec<ComplianceIssue>,
    ) {
        let mode = self.mode();
        let slot = CoreSlot::plain(color);
        let Some(anchor) = self.cores.get(slot) else {
            tracing::debug!(%mode, layer = %surface.layer, %color, "no status anchor");
            return;
        };
        let name = element_property(mode, &surface.layer, &[color.as_str(), "text"]);
        let derivation = Derivation::from_inputs([slot.property(mode)]).against(surface.backdrop.name.clone());
        self.foreground(name, anchor, &surface.backdrop, true, derivation, map, issues);
    }

    /// Step `anchor` along its ramp until it reads on `backdrop`, then
    /// write the result. `blended` applies the text emphasis.
    #[allow(clippy::too_many_arguments)]
    fn foreground(
        &self,
        name: PropertyName,
        anchor: &Anchor,
        backdrop: &Backdrop,
        blended: bool,
        mut derivation: Derivation,
        map: &mut PropertyMap,
        issues: &mut Vec<ComplianceIssue>,
    ) -> Option<Step> {
        let index = self.resolver.index();
        let Some((ramp, start)) = index.ramp(&anchor.token.key).zip(anchor.token.level) else {
            issues.push(ComplianceIssue::warning(
                IssueKind::Reference,
                name.as_str(),
                format!("{} is not a ramp level", anchor.token),
            ));
            return None;
        };
        let emphasis = self.emphasis.filter(|e| blended && e.opacity < 1.0);
        let opacity = emphasis.map_or(1.0, |e| e.opacity);
        let step = step_until_compliant(ramp, start, backdrop.color, opacity)?;

        if let Some(issue) = step.issue(name.as_str(), ramp) {
            tracing::warn!(%name, ratio = step.ratio, "no compliant level");
            issues.push(issue);
        }

        let fg = PropertyName::token(&ramp.token(step.level));
        let value = match emphasis {
            Some(e) => {
                derivation.inputs.insert(e.property());
                PropertyValue::Blend {
                    fg,
                    bg: PropertyName::token(&backdrop.token),
                    opacity: Opacity::Ref(e.property()),
                }
            }
            None => PropertyValue::Ref(fg),
        };
        tracing::debug!(%name, level = %step.level, ratio = step.ratio, tried = step.tried.len(), "element derived");
        map.derive(name, value, derivation);
        Some(step)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
