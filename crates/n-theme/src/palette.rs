//! Palette resolution — tone / on-tone pairs for every ramp level.
//!
//! A palette binds a key to a whole color ramp:
//!
//! ```text
//! themes.light.palettes.accent = { "$value": "{tokens.color.salmon}", "$primary": "500" }
//! ```
//!
//! Each level of the ramp becomes a `tone` (a reference to the level's
//! token) and an `on-tone` (a reference to whichever of the core black and
//! white anchors reads best on it). The `$primary` level is additionally
//! exposed as `primary-tone` / `primary-on-tone`.
//!
//! When neither anchor reaches AA on a tone the better one is still used
//! and an [`IssueKind::OnTone`] warning is recorded. Fixing that means
//! editing the ramp, which is outside what the engine may change.

use std::collections::BTreeMap;

use n_color::{AA_THRESHOLD, Color, contrast_ratio};
use n_token::{Level, Mode, PropertyName, PropertyValue, Reference, Resolver, Subsystem, Target};

use crate::anchor::{Anchor, CoreColors, CoreSlot};
use crate::issue::{ComplianceIssue, IssueKind};
use crate::map::{Binding, Derivation, PropertyMap};

// ---------------------------------------------------------------------------
// On-tone choice
// ---------------------------------------------------------------------------

/// The anchor chosen to sit on a tone.
#[derive(Debug, Clone, PartialEq)]
pub struct OnTone {
    pub slot: CoreSlot,
    pub anchor: Anchor,
    pub ratio: f64,
}

impl OnTone {
    #[must_use]
    pub fn compliant(&self) -> bool {
        self.ratio >= AA_THRESHOLD
    }
}

/// Choose black or white for `tone`.
///
/// Both pass: the higher contrast wins. One passes: that one. Neither
/// passes: the higher contrast anyway, and the caller reports it.
#[must_use]
pub fn pick_on_tone(tone: Color, black: &Anchor, white: &Anchor) -> OnTone {
    let on_black = contrast_ratio(tone, black.color);
    let on_white = contrast_ratio(tone, white.color);
    let use_black = match (on_black >= AA_THRESHOLD, on_white >= AA_THRESHOLD) {
        (true, false) => true,
        (false, true) => false,
        (true, true) | (false, false) => on_black >= on_white,
    };
    if use_black {
        OnTone {
            slot: CoreSlot::BLACK,
            anchor: black.clone(),
            ratio: on_black,
        }
    } else {
        OnTone {
            slot: CoreSlot::WHITE,
            anchor: white.clone(),
            ratio: on_white,
        }
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteLevel {
    pub level: Level,
    pub tone: Anchor,
    pub on_tone: Option<OnTone>,
}

/// A resolved palette of one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub key: String,
    /// Canonical ramp name.
    pub ramp: String,
    pub primary: Option<Level>,
    pub levels: Vec<PaletteLevel>,
}

impl Palette {
    #[must_use]
    pub fn level(&self, level: Level) -> Option<&PaletteLevel> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// `--brand-<mode>-palettes-<key>-<level|primary>-tone`.
    #[must_use]
    pub fn tone_property(mode: Mode, key: &str, level: Option<Level>) -> PropertyName {
        PropertyName::brand(mode, Subsystem::Palettes, &[key, level_segment(level).as_str(), "tone"])
    }

    /// `--brand-<mode>-palettes-<key>-<level|primary>-on-tone`.
    #[must_use]
    pub fn on_tone_property(mode: Mode, key: &str, level: Option<Level>) -> PropertyName {
        PropertyName::brand(mode, Subsystem::Palettes, &[key, level_segment(level).as_str(), "on-tone"])
    }
}

fn level_segment(level: Option<Level>) -> String {
    level.map_or_else(|| "primary".to_string(), |l| l.to_string())
}

/// Resolve and emit every palette the theme declares for the resolver's
/// mode.
pub fn resolve_palettes(
    resolver: &Resolver<'_>,
    cores: &CoreColors,
    map: &mut PropertyMap,
    issues: &mut Vec<ComplianceIssue>,
) -> BTreeMap<String, Palette> {
    let mode = resolver.mode();
    let mut palettes = BTreeMap::new();
    for key in resolver.theme().keys(&["themes", mode.as_str(), "palettes"]) {
        if let Some(palette) = resolve_palette(resolver, &key, cores, issues) {
            emit(mode, &palette, cores, map);
            palettes.insert(key, palette);
        }
    }
    palettes
}

fn resolve_palette(
    resolver: &Resolver<'_>,
    key: &str,
    cores: &CoreColors,
    issues: &mut Vec<ComplianceIssue>,
) -> Option<Palette> {
    let mode = resolver.mode();
    let node = ["themes", mode.as_str(), "palettes", key];
    let locus = node.join(".");

    let text = resolver.theme().leaf_str(&node).unwrap_or_default();
    let ramp_name = match resolver.resolve(&Reference::parse(text)) {
        Ok(Target::Ramp(name)) => name,
        Ok(Target::Token(token)) => {
            issues.push(ComplianceIssue::warning(
                IssueKind::Reference,
                &locus,
                format!("palette must bind a whole ramp, found {token}"),
            ));
            return None;
        }
        Err(err) => {
            tracing::warn!(%mode, palette = key, %err, "palette unresolved");
            issues.push(ComplianceIssue::warning(IssueKind::Reference, &locus, err.to_string()));
            return None;
        }
    };
    let ramp = resolver.index().ramp(&ramp_name)?;

    let primary = resolver
        .theme()
        .get(&node)
        .and_then(|n| n.get("$primary"))
        .and_then(serde_json::Value::as_str);
    let primary = match primary {
        None => None,
        Some(text) => match Level::parse(text).filter(|l| ramp.color(*l).is_some()) {
            Some(level) => Some(level),
            None => {
                issues.push(ComplianceIssue::warning(
                    IssueKind::Reference,
                    format!("{locus}.$primary"),
                    format!("{text:?} is not a level of ramp {ramp_name:?}"),
                ));
                None
            }
        },
    };

    let anchors = cores.black().zip(cores.white());
    if anchors.is_none() {
        issues.push(ComplianceIssue::warning(
            IssueKind::Reference,
            &locus,
            "core black/white unresolved; on-tones skipped",
        ));
    }

    let mut levels = Vec::with_capacity(ramp.len());
    for level in ramp.levels() {
        let Some(color) = ramp.color(level) else { continue };
        let tone = Anchor {
            token: ramp.token(level),
            color,
        };
        let on_tone = anchors.map(|(black, white)| pick_on_tone(color, black, white));
        if let Some(choice) = on_tone.as_ref().filter(|c| !c.compliant()) {
            let mut names = vec![Palette::on_tone_property(mode, key, Some(level))];
            if primary == Some(level) {
                names.push(Palette::on_tone_property(mode, key, None));
            }
            for name in names {
                tracing::warn!(%name, ratio = choice.ratio, "neither anchor reaches AA on tone");
                issues.push(
                    ComplianceIssue::warning(
                        IssueKind::OnTone,
                        name.as_str(),
                        format!("neither black nor white reaches AA on {}", tone.token),
                    )
                    .with_ratio(choice.ratio),
                );
            }
        }
        levels.push(PaletteLevel { level, tone, on_tone });
    }

    tracing::debug!(%mode, palette = key, ramp = %ramp_name, levels = levels.len(), "palette resolved");
    Some(Palette {
        key: key.to_string(),
        ramp: ramp_name,
        primary,
        levels,
    })
}

fn emit(mode: Mode, palette: &Palette, cores: &CoreColors, map: &mut PropertyMap) {
    let key = palette.key.as_str();
    let mut emit_level = |entry: &PaletteLevel, slot: Option<Level>| {
        let tone_name = Palette::tone_property(mode, key, slot);
        let tone_input = match slot {
            // The primary pair follows its level's pair.
            None => Palette::tone_property(mode, key, Some(entry.level)),
            Some(_) => entry.tone.property(),
        };
        map.derive(
            tone_name.clone(),
            PropertyValue::Ref(entry.tone.property()),
            Derivation::from_inputs([tone_input]),
        );
        map.bind(
            tone_name.clone(),
            Binding::PaletteTone {
                mode,
                key: key.to_string(),
                level: slot,
            },
        );
        if let Some(on_tone) = &entry.on_tone {
            map.derive(
                Palette::on_tone_property(mode, key, slot),
                PropertyValue::Ref(on_tone.anchor.property()),
                Derivation::from_inputs(cores.contrast_inputs()).against(tone_name),
            );
        }
    };

    for entry in &palette.levels {
        emit_level(entry, Some(entry.level));
    }
    if let Some(entry) = palette.primary.and_then(|l| palette.level(l)) {
        emit_level(entry, None);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
