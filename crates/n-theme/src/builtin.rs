//! Named presets — complete token, theme, and UI-kit documents.
//!
//! Each preset is a starting point that builds cleanly: every binding
//! resolves and every derived pair reaches AA in both modes. `default` is a
//! neutral gray system with a blue accent and text at 87% emphasis;
//! `high-contrast` uses the same tokens with pure black/white surfaces,
//! darker interactive anchors, and full-opacity text.

use n_token::Document;
use serde_json::{Value, json};

use crate::context::Context;
use crate::options::EngineOptions;

/// A preset's three documents.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub tokens: Document,
    pub theme: Document,
    pub ui_kit: Document,
}

impl Preset {
    #[must_use]
    pub fn into_context(self, options: EngineOptions) -> Context {
        Context::new(self.tokens, self.theme, self.ui_kit, options)
    }
}

/// Look up a builtin preset by name.
///
/// Returns `None` if the name is not recognized.
#[must_use]
pub fn builtin_preset(name: &str) -> Option<Preset> {
    let (name, light, dark) = match name {
        "default" => ("default", DEFAULT_LIGHT, DEFAULT_DARK),
        "high-contrast" => ("high-contrast", HIGH_CONTRAST_LIGHT, HIGH_CONTRAST_DARK),
        _ => return None,
    };
    let theme = json!({ "themes": { "light": light.bindings(), "dark": dark.bindings() } });
    Some(Preset {
        name,
        tokens: Document::from_value("tokens", tokens()).ok()?,
        theme: Document::from_value("theme", theme).ok()?,
        ui_kit: Document::from_value("ui-kit", ui_kit()).ok()?,
    })
}

/// List all available builtin preset names.
#[must_use]
pub const fn builtin_names() -> &'static [&'static str] {
    &["default", "high-contrast"]
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

const GRAY: [(&str, &str); 12] = [
    ("000", "#ffffff"),
    ("050", "#f5f5f5"),
    ("100", "#e8e8e8"),
    ("200", "#d1d1d1"),
    ("300", "#b4b4b4"),
    ("400", "#959595"),
    ("500", "#767676"),
    ("600", "#5e5e5e"),
    ("700", "#474747"),
    ("800", "#303030"),
    ("900", "#1c1c1c"),
    ("1000", "#000000"),
];

const BLUE: [(&str, &str); 9] = [
    ("100", "#dbe8ff"),
    ("200", "#b3ceff"),
    ("300", "#80abff"),
    ("400", "#4d8af0"),
    ("500", "#2f6fde"),
    ("600", "#1e5bc6"),
    ("700", "#17479c"),
    ("800", "#113473"),
    ("900", "#0b214a"),
];

const RED: [(&str, &str); 9] = [
    ("100", "#ffe0de"),
    ("200", "#ffb8b3"),
    ("300", "#ff8a80"),
    ("400", "#f55a4e"),
    ("500", "#e0352b"),
    ("600", "#bf2519"),
    ("700", "#951c13"),
    ("800", "#6b140e"),
    ("900", "#420c08"),
];

const AMBER: [(&str, &str); 9] = [
    ("100", "#fff1d6"),
    ("200", "#ffe0a3"),
    ("300", "#ffcb66"),
    ("400", "#f5b12e"),
    ("500", "#d99100"),
    ("600", "#b07400"),
    ("700", "#855700"),
    ("800", "#5c3c00"),
    ("900", "#332100"),
];

const GREEN: [(&str, &str); 9] = [
    ("100", "#dcf5e3"),
    ("200", "#b0e8c0"),
    ("300", "#7dd697"),
    ("400", "#4bbf6d"),
    ("500", "#2ea052"),
    ("600", "#208040"),
    ("700", "#186130"),
    ("800", "#104421"),
    ("900", "#082612"),
];

fn ramp(alias: &str, levels: &[(&str, &str)]) -> Value {
    let mut node = serde_json::Map::new();
    node.insert("$alias".to_string(), json!(alias));
    for (level, hex) in levels {
        node.insert((*level).to_string(), json!({ "$value": hex, "$type": "color" }));
    }
    Value::Object(node)
}

fn tokens() -> Value {
    json!({
        "color": {
            "gray": ramp("neutral", &GRAY),
            "blue": ramp("brand", &BLUE),
            "red": ramp("danger", &RED),
            "amber": ramp("caution", &AMBER),
            "green": ramp("positive", &GREEN)
        },
        "opacity": {
            "full": { "$value": 1 },
            "high": { "$value": 0.87 },
            "medium": { "$value": 0.6 },
            "disabled": { "$value": 0.38 }
        },
        "size": {
            "xs": { "$value": 4 },
            "sm": { "$value": 8 },
            "md": { "$value": 16 },
            "lg": { "$value": 24 },
            "xl": { "$value": 32 }
        },
        "font-family": {
            "sans": { "$value": "Inter, sans-serif" },
            "mono": { "$value": "JetBrains Mono, monospace" }
        },
        "font-size": {
            "body": { "$value": 14 },
            "heading": { "$value": 20 }
        },
        "font-weight": {
            "regular": { "$value": 400 },
            "bold": { "$value": 600 }
        },
        "line-height": {
            "body": { "$value": 1.5 },
            "heading": { "$value": 1.25 }
        }
    })
}

// ---------------------------------------------------------------------------
// Theme bindings
// ---------------------------------------------------------------------------

/// Per-mode choices; everything else is shared.
struct ModeSpec {
    alert: &'static str,
    warning: &'static str,
    success: &'static str,
    interactive: (&'static str, &'static str),
    layers: [&'static str; 4],
    alternative_primary: &'static str,
    alternative_danger: &'static str,
    emphasis: &'static str,
}

const DEFAULT_LIGHT: ModeSpec = ModeSpec {
    alert: "red.600",
    warning: "amber.700",
    success: "green.700",
    interactive: ("blue.600", "blue.700"),
    layers: ["gray.000", "neutral.050", "gray.100", "gray.200"],
    alternative_primary: "{brand.palettes.primary}",
    alternative_danger: "{brand.palettes.danger.100}",
    emphasis: "high",
};

const DEFAULT_DARK: ModeSpec = ModeSpec {
    alert: "red.300",
    warning: "amber.300",
    success: "green.300",
    interactive: ("blue.300", "blue.200"),
    layers: ["gray.1000", "gray.900", "gray.800", "gray.700"],
    alternative_primary: "{brand.palettes.primary.800}",
    alternative_danger: "{brand.palettes.danger.900}",
    emphasis: "high",
};

const HIGH_CONTRAST_LIGHT: ModeSpec = ModeSpec {
    alert: "red.700",
    warning: "amber.800",
    success: "green.800",
    interactive: ("blue.800", "blue.900"),
    layers: ["gray.000", "gray.000", "gray.050", "gray.100"],
    alternative_primary: "{brand.palettes.primary.900}",
    alternative_danger: "{brand.palettes.danger.100}",
    emphasis: "full",
};

const HIGH_CONTRAST_DARK: ModeSpec = ModeSpec {
    alert: "red.200",
    warning: "amber.200",
    success: "green.200",
    interactive: ("blue.200", "blue.100"),
    layers: ["gray.1000", "gray.1000", "gray.900", "gray.800"],
    alternative_primary: "{brand.palettes.primary.900}",
    alternative_danger: "{brand.palettes.danger.900}",
    emphasis: "full",
};

fn color(path: &str) -> Value {
    json!({ "$value": format!("{{tokens.color.{path}}}") })
}

impl ModeSpec {
    fn bindings(&self) -> Value {
        let surface = |path: &str| json!({ "surface": color(path) });
        json!({
            "palettes": {
                "neutral": { "$value": "{tokens.color.gray}", "$primary": "500" },
                "primary": { "$value": "{tokens.color.brand}", "$primary": "600" },
                "danger": { "$value": "{tokens.color.red}", "$primary": "600" },
                "caution": { "$value": "{tokens.color.amber}", "$primary": "500" },
                "positive": { "$value": "{tokens.color.green}", "$primary": "600" }
            },
            "core-colors": {
                "black": color("gray.1000"),
                "white": color("gray.000"),
                "alert": color(self.alert),
                "warning": color(self.warning),
                "success": color(self.success),
                "interactive": {
                    "default": color(self.interactive.0),
                    "hover": color(self.interactive.1)
                }
            },
            "layers": {
                "layer-0": surface(self.layers[0]),
                "layer-1": surface(self.layers[1]),
                "layer-2": surface(self.layers[2]),
                "layer-3": surface(self.layers[3]),
                "alternative": {
                    "primary": { "surface": { "$value": self.alternative_primary } },
                    "danger": { "surface": { "$value": self.alternative_danger } }
                }
            },
            "text-emphasis": { "$value": format!("{{tokens.opacity.{}}}", self.emphasis) },
            "elevations": {
                "1": {
                    "shadow": color("gray.1000"),
                    "opacity": { "$value": "{tokens.opacity.disabled}" },
                    "blur": { "$value": "{tokens.size.sm}" }
                },
                "2": {
                    "shadow": color("gray.1000"),
                    "opacity": { "$value": "{tokens.opacity.medium}" },
                    "blur": { "$value": "{tokens.size.lg}" }
                }
            },
            "typography": {
                "body": {
                    "family": { "$value": "{tokens.font-family.sans}" },
                    "size": { "$value": "{tokens.font-size.body}" },
                    "weight": { "$value": "{tokens.font-weight.regular}" },
                    "line-height": { "$value": "{tokens.line-height.body}" }
                },
                "heading": {
                    "family": { "$value": "{tokens.font-family.sans}" },
                    "size": { "$value": "{tokens.font-size.heading}" },
                    "weight": { "$value": "{tokens.font-weight.bold}" },
                    "line-height": { "$value": "{tokens.line-height.heading}" }
                },
                "code": {
                    "family": { "$value": "{tokens.font-family.mono}" },
                    "size": { "$value": "{tokens.font-size.body}" }
                }
            },
            "dimensions": {
                "gutter": { "$value": "{tokens.size.md}" },
                "radius": { "$value": "{tokens.size.xs}" },
                "section": { "$value": "{tokens.size.xl}" }
            }
        })
    }
}

fn ui_kit() -> Value {
    json!({
        "page": {
            "background": { "$value": "{brand.layer.0.surface}" },
            "text": { "$value": "{brand.layer.0.text}" }
        },
        "card": {
            "background": { "$value": "{brand.layer.1.surface}" },
            "text": { "$value": "{brand.layer.1.text}" },
            "shadow": { "$value": "{brand.elevations.1.shadow}" }
        },
        "button": {
            "primary": {
                "background": { "$value": "{brand.layer.1.interactive.default.tone}" },
                "label": { "$value": "{brand.layer.1.interactive.default.on-tone}" },
                "hover-background": { "$value": "{brand.layer.1.interactive.hover.tone}" },
                "hover-label": { "$value": "{brand.layer.1.interactive.hover.on-tone}" },
                "radius": { "$value": "{brand.dimensions.radius}" }
            }
        },
        "banner": {
            "danger": {
                "background": { "$value": "{brand.layer.alternative.danger.surface}" },
                "text": { "$value": "{brand.layer.alternative.danger.alert.text}" }
            }
        },
        "text": {
            "body": { "$value": "{brand.typography.body.family}" },
            "code": { "$value": "{brand.typography.code.family}" }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_color::{AA_THRESHOLD, Color, contrast_ratio};
    use n_token::{Opacity, PropertyName, PropertyValue, TokenValue};

    use crate::engine::{Computation, compute};
    use crate::issue::IssueKind;

    #[test]
    fn all_builtins_resolve() {
        for name in builtin_names() {
            let preset = builtin_preset(name);
            assert!(preset.is_some(), "Builtin '{name}' failed to load");
        }
    }

    #[test]
    fn unknown_returns_none() {
        assert!(builtin_preset("nonexistent").is_none());
    }

    /// Composite color of a rendered-by-engine value, from the token tier
    /// of the same map.
    fn color_of(c: &Computation, name: &PropertyName) -> Color {
        let token = |n: &PropertyName| match c.map.get(n) {
            Some(PropertyValue::Literal(text)) => text.clone(),
            Some(PropertyValue::Ref(next)) => match c.map.get(next) {
                Some(PropertyValue::Literal(text)) => text.clone(),
                other => panic!("{next} is {other:?}"),
            },
            other => panic!("{n} is {other:?}"),
        };
        match c.map.get(name) {
            Some(PropertyValue::Blend { fg, bg, opacity: Opacity::Ref(op) }) => {
                let opacity: f64 = token(op).parse().unwrap();
                Color::hex(&token(fg)).unwrap().blend_over(Color::hex(&token(bg)).unwrap(), opacity)
            }
            _ => Color::hex(&token(name)).unwrap(),
        }
    }

    #[test]
    fn presets_build_cleanly() {
        for name in builtin_names() {
            let ctx = builtin_preset(name).unwrap().into_context(EngineOptions::default());
            assert!(ctx.index().rejected().is_empty(), "{name}");
            assert!(
                ctx.index().iter().any(|(_, v)| matches!(v, TokenValue::Dimension(_))),
                "{name}"
            );

            let c = compute(&ctx);
            let references: Vec<_> = c.issues.iter().filter(|i| i.kind == IssueKind::Reference).collect();
            assert!(references.is_empty(), "{name}: {references:?}");
            assert!(c.map.literal_indirections().is_empty(), "{name}");

            let exhausted: Vec<&str> = c
                .issues
                .iter()
                .filter(|i| i.kind == IssueKind::Exhausted)
                .map(|i| i.locus.as_str())
                .collect();
            for (fg, bg) in c.map.pairs() {
                if fg.as_str().contains("-palettes-") {
                    continue;
                }
                let ratio = contrast_ratio(color_of(&c, fg), color_of(&c, bg));
                assert!(
                    ratio >= AA_THRESHOLD || exhausted.contains(&fg.as_str()),
                    "{name}: {fg} on {bg} at {ratio:.2}:1"
                );
            }
        }
    }

    #[test]
    fn presets_differ() {
        let a = compute(&builtin_preset("default").unwrap().into_context(EngineOptions::default()));
        let b = compute(&builtin_preset("high-contrast").unwrap().into_context(EngineOptions::default()));
        let name = PropertyName::new("--brand-light-layer-0-text");
        assert_ne!(a.map.get(&name), b.map.get(&name));
    }
}
