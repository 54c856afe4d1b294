//! Change notifications.
//!
//! Payloads carry property names only. A listener that wants values reads
//! them from the registry.

use std::fmt;

use n_token::PropertyName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Token-tier properties whose token changed.
    TokenChanged(Vec<PropertyName>),
    /// Tone properties of a palette whose family or levels changed.
    PaletteChanged(Vec<PropertyName>),
    /// Properties of a palette that no longer exists.
    PaletteDeleted(Vec<PropertyName>),
    /// A batch of live properties was written.
    PropertiesUpdated(Vec<PropertyName>),
}

impl ChangeEvent {
    #[must_use]
    pub fn names(&self) -> &[PropertyName] {
        match self {
            Self::TokenChanged(names)
            | Self::PaletteChanged(names)
            | Self::PaletteDeleted(names)
            | Self::PropertiesUpdated(names) => names,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TokenChanged(_) => "token-changed",
            Self::PaletteChanged(_) => "palette-changed",
            Self::PaletteDeleted(_) => "palette-deleted",
            Self::PropertiesUpdated(_) => "properties-updated",
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} properties)", self.kind(), self.names().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_counts_names() {
        let event = ChangeEvent::PaletteDeleted(vec![
            PropertyName::new("--brand-light-palettes-blue-500-tone"),
            PropertyName::new("--brand-light-palettes-blue-500-on-tone"),
        ]);
        assert_eq!(event.to_string(), "palette-deleted (2 properties)");
        assert_eq!(event.names().len(), 2);
    }
}
