//! Output property names.
//!
//! Every property the engine writes lives in one of three tiers:
//!
//! | Tier     | Shape                                    | Example                               |
//! |----------|------------------------------------------|---------------------------------------|
//! | tokens   | `--tokens-<category>-<key>[-<level>]`    | `--tokens-color-gray-500`             |
//! | brand    | `--brand-<mode>-<subsystem>-<path…>`     | `--brand-light-layer-0-text`          |
//! | ui       | `--ui-<component path…>`                 | `--ui-button-primary-background`      |
//!
//! Token-tier values are literals. Brand-tier and UI-tier values are always
//! indirections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::index::TokenPath;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Color scheme a brand binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Light,
    Dark,
}

impl Mode {
    pub const ALL: [Self; 2] = [Self::Light, Self::Dark];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown mode {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsystem / Tier
// ---------------------------------------------------------------------------

/// Brand-tier subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subsystem {
    Palettes,
    Core,
    Layer,
    Elevations,
    Typography,
    Dimensions,
}

impl Subsystem {
    pub const ALL: [Self; 6] = [
        Self::Palettes,
        Self::Core,
        Self::Layer,
        Self::Elevations,
        Self::Typography,
        Self::Dimensions,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Palettes => "palettes",
            Self::Core => "core",
            Self::Layer => "layer",
            Self::Elevations => "elevations",
            Self::Typography => "typography",
            Self::Dimensions => "dimensions",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sub| sub.as_str() == s)
    }
}

/// Namespace of a property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Tokens,
    Brand,
    Ui,
    /// Not managed by the engine.
    Foreign,
}

// ---------------------------------------------------------------------------
// PropertyName
// ---------------------------------------------------------------------------

/// A fully-qualified custom property name, including the leading `--`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    /// Wrap an arbitrary name. A missing `--` prefix is added.
    #[must_use]
    pub fn new(name: &str) -> Self {
        if name.starts_with("--") {
            Self(name.to_string())
        } else {
            Self(format!("--{name}"))
        }
    }

    /// Token-tier name for a token path.
    #[must_use]
    pub fn token(path: &TokenPath) -> Self {
        Self(format!("--tokens-{}", path.segments().join("-")))
    }

    /// Brand-tier name.
    #[must_use]
    pub fn brand<S: AsRef<str>>(mode: Mode, subsystem: Subsystem, path: &[S]) -> Self {
        let mut name = format!("--brand-{mode}-{}", subsystem.as_str());
        for segment in path {
            name.push('-');
            name.push_str(segment.as_ref());
        }
        Self(name)
    }

    /// UI-tier name.
    #[must_use]
    pub fn ui<S: AsRef<str>>(path: &[S]) -> Self {
        let parts: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
        Self(format!("--ui-{}", parts.join("-")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        if self.0.starts_with("--tokens-") {
            Tier::Tokens
        } else if self.0.starts_with("--brand-") {
            Tier::Brand
        } else if self.0.starts_with("--ui-") {
            Tier::Ui
        } else {
            Tier::Foreign
        }
    }

    /// Mode encoded in a brand-tier name.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        let rest = self.0.strip_prefix("--brand-")?;
        let mode = rest.split('-').next()?;
        mode.parse().ok()
    }

    /// Whether the engine owns this name.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.tier() != Tier::Foreign
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Level;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_names() {
        let gray = TokenPath::color("gray", Level::new(50));
        assert_eq!(PropertyName::token(&gray).as_str(), "--tokens-color-gray-050");
        let size = TokenPath::new("size", "spacing-md");
        assert_eq!(PropertyName::token(&size).as_str(), "--tokens-size-spacing-md");
    }

    #[test]
    fn brand_names_encode_mode_and_subsystem() {
        let name = PropertyName::brand(Mode::Dark, Subsystem::Layer, &["0", "text"]);
        assert_eq!(name.as_str(), "--brand-dark-layer-0-text");
        assert_eq!(name.tier(), Tier::Brand);
        assert_eq!(name.mode(), Some(Mode::Dark));
    }

    #[test]
    fn ui_names() {
        let name = PropertyName::ui(&["button", "primary", "background"]);
        assert_eq!(name.as_str(), "--ui-button-primary-background");
        assert_eq!(name.tier(), Tier::Ui);
        assert_eq!(name.mode(), None);
    }

    #[test]
    fn foreign_names_are_unmanaged() {
        let name = PropertyName::new("app-accent");
        assert_eq!(name.as_str(), "--app-accent");
        assert_eq!(name.tier(), Tier::Foreign);
        assert!(!name.is_managed());
    }

    #[test]
    fn modes_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>(), Ok(mode));
        }
        assert!("sepia".parse::<Mode>().is_err());
    }

    #[test]
    fn subsystem_parse() {
        assert_eq!(Subsystem::parse("layer"), Some(Subsystem::Layer));
        assert_eq!(Subsystem::parse("layers"), None);
    }
}
