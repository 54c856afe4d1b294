//! Full property-map computation.
//!
//! One pass over a [`Context`], in three tiers:
//!
//! ```text
//! tokens   every indexed token → a literal
//!    │
//!    ▼
//! brand    per mode: core colors, palettes, elevations/typography/dimensions
//!    │
//!    ▼
//! derived  per mode: layer surfaces and their element colors
//!    │
//!    ▼
//! ui-kit   component bindings → brand properties of `ui-kit-mode`
//! ```
//!
//! Later tiers read earlier ones and never rewrite them. The pass is pure:
//! the same context always yields the same map and issues.

use std::collections::BTreeMap;

use n_token::{
    Mode, PropertyName, PropertyValue, Reference, Resolver, Subsystem, TokenError, TokenIndex,
};

use crate::anchor::CoreColors;
use crate::context::Context;
use crate::issue::{ComplianceIssue, ComplianceReport, IssueKind};
use crate::layer::{Emphasis, LayerInputs, resolve_layers};
use crate::map::{Binding, Derivation, PropertyMap};
use crate::palette::resolve_palettes;

/// Brand subsystems copied through as plain token bindings.
const PASS_THROUGH: [Subsystem; 3] = [Subsystem::Elevations, Subsystem::Typography, Subsystem::Dimensions];

/// Result of one computation pass.
#[derive(Debug, Clone, Default)]
pub struct Computation {
    pub map: PropertyMap,
    pub issues: Vec<ComplianceIssue>,
    /// Resolved core colors per mode.
    pub cores: BTreeMap<Mode, CoreColors>,
}

impl Computation {
    #[must_use]
    pub fn report(&self) -> ComplianceReport {
        ComplianceReport::from(self.issues.clone())
    }
}

/// Compute the complete property map for `ctx`.
#[must_use]
pub fn compute(ctx: &Context) -> Computation {
    let mut out = Computation::default();

    emit_tokens(ctx.index(), &mut out);

    for mode in ctx.modes() {
        let resolver = ctx.resolver(mode);
        let cores = CoreColors::resolve(&resolver, &mut out.issues);
        cores.emit(&mut out.map);
        let palettes = resolve_palettes(&resolver, &cores, &mut out.map, &mut out.issues);
        for subsystem in PASS_THROUGH {
            pass_through(&resolver, subsystem, &mut out.map, &mut out.issues);
        }

        let emphasis = Emphasis::resolve(
            &resolver,
            ctx.options().text_emphasis.as_deref(),
            &mut out.issues,
        );
        let inputs = LayerInputs {
            resolver: &resolver,
            cores: &cores,
            palettes: &palettes,
            emphasis: emphasis.as_ref(),
        };
        resolve_layers(&inputs, &mut out.map, &mut out.issues);
        out.cores.insert(mode, cores);
    }

    emit_ui_kit(ctx, &mut out);

    tracing::info!(
        properties = out.map.len(),
        issues = out.issues.len(),
        errors = out.issues.iter().filter(|i| i.is_error()).count(),
        "property map computed"
    );
    out
}

fn emit_tokens(index: &TokenIndex, out: &mut Computation) {
    for (path, value) in index.iter() {
        let name = PropertyName::token(path);
        out.map.insert(name.clone(), PropertyValue::Literal(value.literal()));
        out.map.bind(name, Binding::Token(path.clone()));
    }
    for rejected in index.rejected() {
        let (locus, reason) = match rejected {
            TokenError::InvalidToken { path, reason } => (path.clone(), reason.clone()),
            other => (String::new(), other.to_string()),
        };
        out.issues.push(ComplianceIssue::warning(IssueKind::InvalidToken, locus, reason));
    }
}

fn pass_through(
    resolver: &Resolver<'_>,
    subsystem: Subsystem,
    map: &mut PropertyMap,
    issues: &mut Vec<ComplianceIssue>,
) {
    let mode = resolver.mode();
    let base = ["themes", mode.as_str(), subsystem.as_str()];
    for leaf in resolver.theme().leaves(&base) {
        let locus = leaf.path.join(".");
        let name = PropertyName::brand(mode, subsystem, &leaf.path[base.len()..]);
        let Some(text) = leaf.value.as_str() else {
            issues.push(ComplianceIssue::warning(
                IssueKind::Reference,
                locus,
                "brand bindings must be references, not literals",
            ));
            continue;
        };
        match resolver.resolve_token(&Reference::parse(text)) {
            Ok(token) => {
                let target = PropertyName::token(&token);
                map.derive(
                    name.clone(),
                    PropertyValue::Ref(target.clone()),
                    Derivation::from_inputs([target]),
                );
                map.bind(name, Binding::Theme(leaf.path.clone()));
            }
            Err(err) => {
                tracing::warn!(%name, %err, "binding unresolved");
                issues.push(ComplianceIssue::warning(IssueKind::Reference, locus, err.to_string()));
            }
        }
    }
}

fn emit_ui_kit(ctx: &Context, out: &mut Computation) {
    let mode = ctx.options().ui_kit_mode;
    let resolver = ctx.resolver(mode);
    for leaf in ctx.ui_kit().leaves(&[]) {
        let locus = format!("ui-kit.{}", leaf.path.join("."));
        let name = PropertyName::ui(&leaf.path);
        let text = leaf.value.as_str().unwrap_or_default();

        let target = match Reference::parse(text) {
            Reference::Property { subsystem, path } => {
                let target = PropertyName::brand(mode, subsystem, &path);
                if out.map.contains(&target) {
                    Ok(target)
                } else {
                    Err(format!("no brand property {target}"))
                }
            }
            reference @ (Reference::Token(_) | Reference::Brand(_)) => resolver
                .resolve_token(&reference)
                .map(|token| PropertyName::token(&token))
                .map_err(|err| err.to_string()),
            Reference::Ramp(family) => Err(format!("{{tokens.color.{family}}} names a whole ramp")),
            Reference::Unresolved(raw) => Err(format!("unrecognized reference {raw:?}")),
        };

        match target {
            Ok(target) => out.map.derive(
                name,
                PropertyValue::Ref(target.clone()),
                Derivation::from_inputs([target]),
            ),
            Err(reason) => {
                tracing::warn!(%name, %reason, "ui-kit binding unresolved");
                out.issues.push(ComplianceIssue::warning(IssueKind::Reference, locus, reason));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_token::Document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::options::EngineOptions;

    fn context(options: EngineOptions) -> Context {
        let tokens = json!({
            "color": {
                "gray": {
                    "000": { "$value": "#ffffff" },
                    "050": { "$value": "#f2f2f2" },
                    "500": { "$value": "#808080" },
                    "900": { "$value": "#000000" },
                    "950": { "$value": "not-a-color" }
                },
                "blue": {
                    "300": { "$value": "#7cb3ff" },
                    "600": { "$value": "#1e63d6" },
                    "700": { "$value": "#174ea6" }
                }
            },
            "size": { "space": { "md": { "$value": 16 } } },
            "opacity": { "high": { "$value": 0.87 } },
            "font-family": { "body": { "$value": "Inter, sans-serif" } }
        });
        let mode = |surface: &str| {
            json!({
                "palettes": { "neutral": { "$value": "{tokens.color.gray}", "$primary": "500" } },
                "core-colors": {
                    "black": { "$value": "{tokens.color.gray.900}" },
                    "white": { "$value": "{tokens.color.gray.000}" },
                    "alert": { "$value": "{tokens.color.blue.700}" },
                    "warning": { "$value": "{tokens.color.blue.700}" },
                    "success": { "$value": "{tokens.color.blue.700}" },
                    "interactive": {
                        "default": { "$value": "{tokens.color.blue.600}" },
                        "hover": { "$value": "{tokens.color.blue.700}" }
                    }
                },
                "layers": { "layer-0": { "surface": { "$value": surface } } },
                "text-emphasis": { "$value": "{tokens.opacity.high}" },
                "typography": { "body": { "family": { "$value": "{tokens.font-family.body}" } } },
                "dimensions": { "gutter": { "$value": "{tokens.size.space-md}" } }
            })
        };
        let theme = json!({ "themes": {
            "light": mode("{brand.palettes.neutral.050}"),
            "dark": mode("{tokens.color.gray.900}")
        } });
        let ui = json!({
            "button": {
                "background": { "$value": "{brand.layer.0.interactive.default.tone}" },
                "label": { "$value": "{brand.layer.0.interactive.default.on-tone}" },
                "missing": { "$value": "{brand.layer.7.text}" }
            }
        });
        Context::new(
            Document::from_value("tokens", tokens).unwrap(),
            Document::from_value("theme", theme).unwrap(),
            Document::from_value("ui-kit", ui).unwrap(),
            options,
        )
    }

    fn value(c: &Computation, name: &str) -> Option<String> {
        c.map.get(&PropertyName::new(name)).map(PropertyValue::render)
    }

    #[test]
    fn tokens_are_literals() {
        let c = compute(&context(EngineOptions::default()));
        assert_eq!(value(&c, "--tokens-color-gray-050").as_deref(), Some("#f2f2f2"));
        assert_eq!(value(&c, "--tokens-size-space-md").as_deref(), Some("16px"));
        assert_eq!(value(&c, "--tokens-opacity-high").as_deref(), Some("0.87"));
        assert!(!c.map.contains(&PropertyName::new("--tokens-color-gray-950")));
        assert!(c.issues.iter().any(|i| i.kind == IssueKind::InvalidToken));
    }

    #[test]
    fn brand_tier_is_pure() {
        let c = compute(&context(EngineOptions::default()));
        assert!(c.map.literal_indirections().is_empty());
        for (name, value) in c.map.iter() {
            if name.tier() == n_token::Tier::Brand {
                for target in value.references() {
                    assert_eq!(target.tier(), n_token::Tier::Tokens, "{name} → {target}");
                }
            }
        }
    }

    #[test]
    fn both_modes_are_emitted() {
        let c = compute(&context(EngineOptions::default()));
        assert_eq!(
            value(&c, "--brand-light-layer-0-surface").as_deref(),
            Some("var(--tokens-color-gray-050)")
        );
        assert_eq!(
            value(&c, "--brand-dark-layer-0-surface").as_deref(),
            Some("var(--tokens-color-gray-900)")
        );
        assert_eq!(
            value(&c, "--brand-dark-typography-body-family").as_deref(),
            Some("var(--tokens-font-family-body)")
        );
        assert_eq!(
            value(&c, "--brand-light-dimensions-gutter").as_deref(),
            Some("var(--tokens-size-space-md)")
        );
        assert_eq!(c.cores.len(), 2);
    }

    #[test]
    fn ui_kit_points_at_configured_mode() {
        let c = compute(&context(EngineOptions::default()));
        assert_eq!(
            value(&c, "--ui-button-background").as_deref(),
            Some("var(--brand-light-layer-0-interactive-default-tone)")
        );
        assert!(c.issues.iter().any(|i| i.locus == "ui-kit.button.missing"));

        let dark = compute(&context(EngineOptions {
            ui_kit_mode: Mode::Dark,
            ..EngineOptions::default()
        }));
        assert_eq!(
            value(&dark, "--ui-button-label").as_deref(),
            Some("var(--brand-dark-layer-0-interactive-default-on-tone)")
        );
    }

    #[test]
    fn configured_emphasis_overrides_theme() {
        let c = compute(&context(EngineOptions {
            text_emphasis: Some("{tokens.opacity.nope}".to_string()),
            ..EngineOptions::default()
        }));
        assert_eq!(
            value(&c, "--brand-light-layer-0-text").as_deref(),
            Some("var(--tokens-color-gray-900)")
        );
        assert!(c.issues.iter().any(|i| i.locus == "options.text-emphasis"));
    }

    #[test]
    fn idempotent() {
        let ctx = context(EngineOptions::default());
        let a = compute(&ctx);
        let b = compute(&ctx);
        assert_eq!(a.map.rendered(), b.map.rendered());
        assert_eq!(a.issues, b.issues);
    }
}
