//! The property map: every name → value the engine produces, plus what
//! each derived value was computed from.
//!
//! Ordered by name so two maps built from the same snapshot render
//! identically.

use std::collections::{BTreeMap, BTreeSet};

use n_token::{Level, Mode, PropertyName, PropertyValue, Tier, TokenPath};

/// Inputs of a derived property and, for foreground colors, the property
/// it must contrast with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derivation {
    pub inputs: BTreeSet<PropertyName>,
    pub background: Option<PropertyName>,
}

impl Derivation {
    #[must_use]
    pub fn from_inputs<I: IntoIterator<Item = PropertyName>>(inputs: I) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            background: None,
        }
    }

    /// Add `background` both as an input and as the contrast partner.
    #[must_use]
    pub fn against(mut self, background: PropertyName) -> Self {
        self.inputs.insert(background.clone());
        self.background = Some(background);
        self
    }
}

/// The document location a property's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A token in the token document.
    Token(TokenPath),
    /// A reference leaf in the theme document.
    Theme(Vec<String>),
    /// One level of a palette (`None` for the primary level).
    PaletteTone {
        mode: Mode,
        key: String,
        level: Option<Level>,
    },
}

/// Which properties changed between two maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapDiff {
    /// Added, or present in both with a different value.
    pub changed: Vec<PropertyName>,
    /// Present only in the older map.
    pub removed: Vec<PropertyName>,
}

impl MapDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    values: BTreeMap<PropertyName, PropertyValue>,
    derivations: BTreeMap<PropertyName, Derivation>,
    bindings: BTreeMap<PropertyName, Binding>,
}

impl PropertyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value with no recorded inputs.
    pub fn insert(&mut self, name: PropertyName, value: PropertyValue) {
        self.values.insert(name, value);
    }

    /// Insert a derived value and record its inputs.
    pub fn derive(&mut self, name: PropertyName, value: PropertyValue, derivation: Derivation) {
        self.derivations.insert(name.clone(), derivation);
        self.values.insert(name, value);
    }

    pub fn bind(&mut self, name: PropertyName, binding: Binding) {
        self.bindings.insert(name, binding);
    }

    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &PropertyName) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn derivation(&self, name: &PropertyName) -> Option<&Derivation> {
        self.derivations.get(name)
    }

    #[must_use]
    pub fn binding(&self, name: &PropertyName) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyName, &PropertyValue)> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &PropertyName> {
        self.values.keys()
    }

    pub fn derivations(&self) -> impl Iterator<Item = (&PropertyName, &Derivation)> {
        self.derivations.iter()
    }

    /// Derived properties that have a contrast partner.
    pub fn pairs(&self) -> impl Iterator<Item = (&PropertyName, &PropertyName)> {
        self.derivations
            .iter()
            .filter_map(|(name, d)| d.background.as_ref().map(|bg| (name, bg)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Brand- or UI-tier properties holding a literal. Always empty for a
    /// map the engine computed.
    #[must_use]
    pub fn literal_indirections(&self) -> Vec<&PropertyName> {
        self.values
            .iter()
            .filter(|(name, value)| matches!(name.tier(), Tier::Brand | Tier::Ui) && value.is_literal())
            .map(|(name, _)| name)
            .collect()
    }

    /// `(name, rendered value)` pairs in name order.
    #[must_use]
    pub fn rendered(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(name, value)| (name.to_string(), value.render()))
            .collect()
    }

    #[must_use]
    pub fn diff(&self, next: &Self) -> MapDiff {
        let changed = next
            .values
            .iter()
            .filter(|(name, value)| self.values.get(*name) != Some(*value))
            .map(|(name, _)| name.clone())
            .collect();
        let removed = self
            .values
            .keys()
            .filter(|name| !next.values.contains_key(*name))
            .cloned()
            .collect();
        MapDiff { changed, removed }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
