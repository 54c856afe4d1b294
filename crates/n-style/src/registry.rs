//! The style registry seam.
//!
//! A registry is the rendering surface's table of custom properties. The
//! engine only ever needs four operations on it, so that is the whole
//! trait. [`MemoryRegistry`] backs tests and the CLI; an embedding binds
//! the trait to its real surface.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use n_token::PropertyName;

/// A live table of custom properties.
pub trait StyleRegistry {
    /// Current text of `name`, if set.
    fn get(&self, name: &PropertyName) -> Option<String>;

    /// Set `name` to `value`, replacing any previous text.
    fn set(&mut self, name: &PropertyName, value: &str);

    /// Remove `name`. Returns whether it was set.
    fn remove(&mut self, name: &PropertyName) -> bool;

    /// Remove every property, managed or not.
    fn clear_all(&mut self);

    /// Every property currently set, in name order.
    fn names(&self) -> Vec<PropertyName>;
}

// ---------------------------------------------------------------------------
// MemoryRegistry
// ---------------------------------------------------------------------------

/// In-memory registry. Counts writes so callers can see how often a
/// property was touched.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    values: BTreeMap<PropertyName, String>,
    writes: BTreeMap<PropertyName, usize>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `name` has been set since creation.
    #[must_use]
    pub fn write_count(&self, name: &PropertyName) -> usize {
        self.writes.get(name).copied().unwrap_or(0)
    }

    /// Total number of `set` calls across all names.
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.writes.values().sum()
    }

    /// Forget the write counters, keeping the values.
    pub fn reset_counts(&mut self) {
        self.writes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StyleRegistry for MemoryRegistry {
    fn get(&self, name: &PropertyName) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &PropertyName, value: &str) {
        *self.writes.entry(name.clone()).or_default() += 1;
        self.values.insert(name.clone(), value.to_string());
    }

    fn remove(&mut self, name: &PropertyName) -> bool {
        self.values.remove(name).is_some()
    }

    fn clear_all(&mut self) {
        self.values.clear();
    }

    fn names(&self) -> Vec<PropertyName> {
        self.values.keys().cloned().collect()
    }
}

/// Render every property of `registry` as one `:root` rule, sorted by name.
#[must_use]
pub fn stylesheet<R: StyleRegistry + ?Sized>(registry: &R) -> String {
    let mut out = String::from(":root {\n");
    let mut names = registry.names();
    names.sort();
    for name in names {
        if let Some(value) = registry.get(&name) {
            let _ = writeln!(out, "  {name}: {value};");
        }
    }
    out.push_str("}\n");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> PropertyName {
        PropertyName::new(s)
    }

    #[test]
    fn set_get_remove() {
        let mut reg = MemoryRegistry::new();
        reg.set(&name("--a"), "#ffffff");
        assert_eq!(reg.get(&name("--a")).as_deref(), Some("#ffffff"));
        assert!(reg.remove(&name("--a")));
        assert!(!reg.remove(&name("--a")));
        assert_eq!(reg.get(&name("--a")), None);
    }

    #[test]
    fn counts_writes_per_name() {
        let mut reg = MemoryRegistry::new();
        reg.set(&name("--a"), "1");
        reg.set(&name("--a"), "2");
        reg.set(&name("--b"), "3");
        assert_eq!(reg.write_count(&name("--a")), 2);
        assert_eq!(reg.write_count(&name("--c")), 0);
        assert_eq!(reg.total_writes(), 3);
        reg.reset_counts();
        assert_eq!(reg.total_writes(), 0);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn clear_all_empties() {
        let mut reg = MemoryRegistry::new();
        reg.set(&name("--a"), "1");
        reg.set(&name("--app-own"), "2");
        reg.clear_all();
        assert!(reg.is_empty());
    }

    #[test]
    fn stylesheet_is_sorted() {
        let mut reg = MemoryRegistry::new();
        reg.set(&name("--tokens-color-gray-900"), "#000000");
        reg.set(&name("--brand-light-core-black"), "var(--tokens-color-gray-900)");
        assert_eq!(
            stylesheet(&reg),
            ":root {\n  --brand-light-core-black: var(--tokens-color-gray-900);\n  --tokens-color-gray-900: #000000;\n}\n"
        );
        assert_eq!(stylesheet(&MemoryRegistry::new()), ":root {\n}\n");
    }
}
