//! Explicit interest registration.
//!
//! Nothing is watched implicitly. A [`WatchTarget`] names a concept (a
//! palette, a layer surface, a core color) and is expanded to concrete
//! property names against the current map each cycle, so a palette that
//! gains levels is still fully covered.

use std::collections::{BTreeMap, BTreeSet};

use n_style::StyleRegistry;
use n_theme::anchor::CoreSlot;
use n_theme::layer::element_property;
use n_theme::{Binding, PropertyMap};
use n_token::{LayerId, Mode, PropertyName};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum WatchTarget {
    /// Every tone of a palette, primary included.
    Palette { mode: Mode, key: String },
    /// A layer's surface property.
    Surface { mode: Mode, layer: LayerId },
    /// A core color anchor.
    Core { mode: Mode, slot: CoreSlot },
    /// One property by name.
    Property(PropertyName),
}

impl WatchTarget {
    /// Property names this target covers in `map`.
    #[must_use]
    pub fn expand(&self, map: &PropertyMap) -> Vec<PropertyName> {
        match self {
            Self::Palette { mode, key } => map
                .names()
                .filter(|name| {
                    matches!(
                        map.binding(name),
                        Some(Binding::PaletteTone { mode: m, key: k, .. }) if m == mode && k == key
                    )
                })
                .cloned()
                .collect(),
            Self::Surface { mode, layer } => vec![element_property(*mode, layer, &["surface"])],
            Self::Core { mode, slot } => vec![slot.property(*mode)],
            Self::Property(name) => vec![name.clone()],
        }
    }
}

/// Watched targets plus the last live value seen for each watched name.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    targets: BTreeSet<WatchTarget>,
    last_values: BTreeMap<PropertyName, Option<String>>,
}

impl WatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target`. Returns `false` if it was already watched.
    pub fn insert(&mut self, target: WatchTarget) -> bool {
        self.targets.insert(target)
    }

    pub fn remove(&mut self, target: &WatchTarget) -> bool {
        self.targets.remove(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &WatchTarget> {
        self.targets.iter()
    }

    /// All names the targets cover in `map`.
    #[must_use]
    pub fn names(&self, map: &PropertyMap) -> BTreeSet<PropertyName> {
        self.targets.iter().flat_map(|t| t.expand(map)).collect()
    }

    /// Watched names whose live value differs from the last one seen.
    ///
    /// A name with no recorded value has no baseline and is not reported.
    /// Nothing is updated; call [`WatchSet::record`] once the change is
    /// handled.
    #[must_use]
    pub fn changed<R: StyleRegistry + ?Sized>(&self, map: &PropertyMap, registry: &R) -> Vec<PropertyName> {
        self.names(map)
            .into_iter()
            .filter(|name| {
                self.last_values
                    .get(name)
                    .is_some_and(|last| *last != registry.get(name))
            })
            .collect()
    }

    /// Remember the current live value of every watched name.
    pub fn record<R: StyleRegistry + ?Sized>(&mut self, map: &PropertyMap, registry: &R) {
        let names = self.names(map);
        self.remember(registry, &names);
    }

    /// Remember the current live value of `names`, watched or not.
    pub fn remember<'a, R, I>(&mut self, registry: &R, names: I)
    where
        R: StyleRegistry + ?Sized,
        I: IntoIterator<Item = &'a PropertyName>,
    {
        for name in names {
            self.last_values.insert(name.clone(), registry.get(name));
        }
    }

    /// The live value recorded for `name`: `None` if never recorded,
    /// `Some(None)` if it was unset when recorded.
    #[must_use]
    pub fn last(&self, name: &PropertyName) -> Option<Option<&str>> {
        self.last_values.get(name).map(Option::as_deref)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_style::MemoryRegistry;
    use n_theme::Derivation;
    use n_token::{Level, PropertyValue};
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> PropertyName {
        PropertyName::new(s)
    }

    fn palette_map() -> PropertyMap {
        let mut map = PropertyMap::new();
        for (level, slot) in [(Some(Level::new(500)), "500"), (None, "primary")] {
            let tone = name(&format!("--brand-light-palettes-accent-{slot}-tone"));
            map.derive(
                tone.clone(),
                PropertyValue::Ref(name("--tokens-color-blue-500")),
                Derivation::from_inputs([name("--tokens-color-blue-500")]),
            );
            map.bind(
                tone,
                Binding::PaletteTone {
                    mode: Mode::Light,
                    key: "accent".to_string(),
                    level,
                },
            );
        }
        map
    }

    #[test]
    fn palette_target_expands_to_tones() {
        let target = WatchTarget::Palette {
            mode: Mode::Light,
            key: "accent".to_string(),
        };
        assert_eq!(
            target.expand(&palette_map()),
            vec![
                name("--brand-light-palettes-accent-500-tone"),
                name("--brand-light-palettes-accent-primary-tone"),
            ]
        );
        let other = WatchTarget::Palette {
            mode: Mode::Dark,
            key: "accent".to_string(),
        };
        assert!(other.expand(&palette_map()).is_empty());
    }

    #[test]
    fn surface_and_core_targets() {
        let map = PropertyMap::new();
        let surface = WatchTarget::Surface {
            mode: Mode::Dark,
            layer: LayerId::Index(2),
        };
        assert_eq!(surface.expand(&map), vec![name("--brand-dark-layer-2-surface")]);
        let core = WatchTarget::Core {
            mode: Mode::Light,
            slot: CoreSlot::BLACK,
        };
        assert_eq!(core.expand(&map), vec![name("--brand-light-core-black")]);
    }

    #[test]
    fn changes_are_detected_against_recorded_values() {
        let map = palette_map();
        let mut reg = MemoryRegistry::new();
        let tone = name("--brand-light-palettes-accent-500-tone");
        reg.set(&tone, "var(--tokens-color-blue-500)");

        let mut set = WatchSet::new();
        set.insert(WatchTarget::Palette {
            mode: Mode::Light,
            key: "accent".to_string(),
        });
        // Nothing recorded yet: no baseline, no change.
        assert!(set.changed(&map, &reg).is_empty());

        set.record(&map, &reg);
        assert!(set.changed(&map, &reg).is_empty());

        reg.set(&tone, "var(--tokens-color-blue-600)");
        assert_eq!(set.changed(&map, &reg), vec![tone.clone()]);
        set.record(&map, &reg);
        assert!(set.changed(&map, &reg).is_empty());
        assert_eq!(set.last(&tone), Some(Some("var(--tokens-color-blue-600)")));
        assert_eq!(set.last(&name("--unwatched")), None);
    }
}
