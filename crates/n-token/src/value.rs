//! Output property values.
//!
//! Three shapes cover everything the engine writes:
//!
//! ```text
//! Literal   #fa8072 | 16px | 0.87 | Inter, sans-serif        (token tier only)
//! Ref       var(--tokens-color-gray-900)
//! Blend     color-mix(in srgb, var(--fg) calc(var(--op) * 100%), var(--bg))
//! ```
//!
//! `Blend` is the rendering surface's own compositing of `fg` over `bg` at
//! the opacity held by another property, so a blended text color stays an
//! indirection all the way down. Parsing the rendered text gives back the
//! same variant.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::index::format_number;
use crate::name::PropertyName;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^var\(\s*(--[A-Za-z0-9_-]+)\s*\)$").expect("var() pattern is valid")
});

static MIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^color-mix\(\s*in\s+srgb\s*,\s*",
        r"var\(\s*(?P<fg>--[A-Za-z0-9_-]+)\s*\)\s+",
        r"(?:calc\(\s*var\(\s*(?P<op>--[A-Za-z0-9_-]+)\s*\)\s*\*\s*100%\s*\)|(?P<pct>[0-9]*\.?[0-9]+)%)",
        r"\s*,\s*var\(\s*(?P<bg>--[A-Za-z0-9_-]+)\s*\)\s*\)$",
    ))
    .expect("color-mix() pattern is valid")
});

/// Weight of the foreground in a [`PropertyValue::Blend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Opacity {
    /// Read from a unit-less token-tier property in `[0, 1]`.
    Ref(PropertyName),
    /// A fixed percentage in `[0, 100]`.
    Percent(f64),
}

/// A property value as written to the style registry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Literal(String),
    Ref(PropertyName),
    Blend {
        fg: PropertyName,
        bg: PropertyName,
        opacity: Opacity,
    },
}

impl PropertyValue {
    #[must_use]
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    #[must_use]
    pub const fn reference(name: PropertyName) -> Self {
        Self::Ref(name)
    }

    /// Parse rendered value text. Anything that isn't a recognized
    /// indirection is a literal.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(caps) = VAR_RE.captures(text) {
            return Self::Ref(PropertyName::new(&caps[1]));
        }
        if let Some(caps) = MIX_RE.captures(text) {
            let opacity = match (caps.name("op"), caps.name("pct")) {
                (Some(op), _) => Opacity::Ref(PropertyName::new(op.as_str())),
                (None, Some(pct)) => match pct.as_str().parse::<f64>() {
                    Ok(p) if (0.0..=100.0).contains(&p) => Opacity::Percent(p),
                    _ => return Self::Literal(text.to_string()),
                },
                (None, None) => return Self::Literal(text.to_string()),
            };
            return Self::Blend {
                fg: PropertyName::new(&caps["fg"]),
                bg: PropertyName::new(&caps["bg"]),
                opacity,
            };
        }
        Self::Literal(text.to_string())
    }

    /// Rendered text for the style registry.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Ref(name) => format!("var({name})"),
            Self::Blend { fg, bg, opacity } => {
                let weight = match opacity {
                    Opacity::Ref(op) => format!("calc(var({op}) * 100%)"),
                    Opacity::Percent(p) => format!("{}%", format_number(*p)),
                };
                format!("color-mix(in srgb, var({fg}) {weight}, var({bg}))")
            }
        }
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// A blend whose weight is a fixed percentage rather than a property.
    #[must_use]
    pub const fn has_fixed_weight(&self) -> bool {
        matches!(self, Self::Blend { opacity: Opacity::Percent(_), .. })
    }

    /// Every property this value reads.
    #[must_use]
    pub fn references(&self) -> Vec<&PropertyName> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Ref(name) => vec![name],
            Self::Blend { fg, bg, opacity } => {
                let mut out = vec![fg, bg];
                if let Opacity::Ref(op) = opacity {
                    out.push(op);
                }
                out
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
