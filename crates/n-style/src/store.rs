//! The property store: the only writer of the live registry.
//!
//! Batches have partial-failure semantics. Each property is validated on
//! its own; a rejected one keeps whatever the registry held before and the
//! rest of the batch still lands. [`PropertyStore::apply_diff`] is the
//! incremental form: only changed properties are written and properties
//! that disappeared are removed, the same way a frame diff only repaints
//! changed cells.

use std::collections::BTreeSet;

use n_theme::{ComplianceIssue, IssueKind, PropertyMap};
use n_token::{PropertyName, PropertyValue, TokenIndex};

use crate::event::ChangeEvent;
use crate::registry::StyleRegistry;
use crate::validator::{ValidationError, Verdict, validate};

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// What one batch did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Written, in batch order. Repaired properties are included.
    pub applied: Vec<PropertyName>,
    /// Properties whose literal was replaced, with the original text.
    pub repaired: Vec<(PropertyName, String)>,
    /// Writes refused at the boundary.
    pub rejected: Vec<ValidationError>,
    /// Removed from the registry.
    pub removed: Vec<PropertyName>,
}

impl ApplyReport {
    /// No repairs and no rejections.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.rejected.is_empty()
    }

    /// Repairs as warnings, rejections as errors.
    #[must_use]
    pub fn issues(&self) -> Vec<ComplianceIssue> {
        let repaired = self.repaired.iter().map(|(name, from)| {
            ComplianceIssue::warning(
                IssueKind::Validation,
                name.as_str(),
                format!("literal {from:?} replaced by a token reference"),
            )
        });
        let rejected = self.rejected.iter().map(|err| {
            ComplianceIssue::error(IssueKind::Validation, err.name().as_str(), err.to_string())
        });
        repaired.chain(rejected).collect()
    }
}

// ---------------------------------------------------------------------------
// PropertyStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PropertyStore<R: StyleRegistry> {
    registry: R,
    /// Everything this store has written and not removed since.
    managed: BTreeSet<PropertyName>,
    events: Vec<ChangeEvent>,
}

impl<R: StyleRegistry> PropertyStore<R> {
    #[must_use]
    pub const fn new(registry: R) -> Self {
        Self {
            registry,
            managed: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    /// Write every property of `map`.
    pub fn apply(&mut self, map: &PropertyMap, index: &TokenIndex) -> ApplyReport {
        let report = self.apply_values(map.iter(), index);
        tracing::info!(
            applied = report.applied.len(),
            repaired = report.repaired.len(),
            rejected = report.rejected.len(),
            "property map applied"
        );
        report
    }

    /// Write what changed from `prev` to `next` and remove what `next` no
    /// longer has.
    pub fn apply_diff(&mut self, prev: &PropertyMap, next: &PropertyMap, index: &TokenIndex) -> ApplyReport {
        let diff = prev.diff(next);
        let changed = diff
            .changed
            .iter()
            .filter_map(|name| next.get(name).map(|value| (name, value)));
        let mut report = self.apply_values(changed, index);
        for name in diff.removed {
            if self.remove_quiet(&name) {
                report.removed.push(name);
            }
        }
        if !report.removed.is_empty() {
            self.events.push(ChangeEvent::PropertiesUpdated(report.removed.clone()));
        }
        tracing::debug!(
            applied = report.applied.len(),
            removed = report.removed.len(),
            "property diff applied"
        );
        report
    }

    /// Validate and write a batch of values.
    pub fn apply_values<'a, I>(&mut self, values: I, index: &TokenIndex) -> ApplyReport
    where
        I: IntoIterator<Item = (&'a PropertyName, &'a PropertyValue)>,
    {
        let mut report = ApplyReport::default();
        for (name, value) in values {
            match validate(name, value.clone(), index) {
                Ok(verdict) => {
                    if let Verdict::Repaired { from, .. } = &verdict {
                        report.repaired.push((name.clone(), from.clone()));
                    }
                    self.put(name, verdict.value());
                    report.applied.push(name.clone());
                }
                Err(err) => {
                    tracing::warn!(%name, %err, "write rejected");
                    report.rejected.push(err);
                }
            }
        }
        if !report.applied.is_empty() {
            self.events.push(ChangeEvent::PropertiesUpdated(report.applied.clone()));
        }
        report
    }

    /// Validate and write one property from its text.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] when the write is refused; the
    /// registry is left untouched.
    pub fn write(&mut self, name: &PropertyName, text: &str, index: &TokenIndex) -> Result<Verdict, ValidationError> {
        let verdict = validate(name, PropertyValue::parse(text), index).inspect_err(|err| {
            tracing::warn!(%name, %err, "write rejected");
        })?;
        self.put(name, verdict.value());
        self.events.push(ChangeEvent::PropertiesUpdated(vec![name.clone()]));
        Ok(verdict)
    }

    /// Remove one property. Returns whether it was set.
    pub fn remove(&mut self, name: &PropertyName) -> bool {
        let removed = self.remove_quiet(name);
        if removed {
            self.events.push(ChangeEvent::PropertiesUpdated(vec![name.clone()]));
        }
        removed
    }

    /// Remove every property this store manages. Properties other writers
    /// put in the registry stay. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let names: Vec<PropertyName> = std::mem::take(&mut self.managed).into_iter().collect();
        let removed: Vec<PropertyName> = names
            .into_iter()
            .filter(|name| self.registry.remove(name))
            .collect();
        let count = removed.len();
        if !removed.is_empty() {
            self.events.push(ChangeEvent::PropertiesUpdated(removed));
        }
        tracing::info!(removed = count, "managed properties cleared");
        count
    }

    /// Live text of `name`.
    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<String> {
        self.registry.get(name)
    }

    /// Live value of `name`, parsed.
    #[must_use]
    pub fn value(&self, name: &PropertyName) -> Option<PropertyValue> {
        self.registry.get(name).map(|text| PropertyValue::parse(&text))
    }

    pub fn managed(&self) -> impl Iterator<Item = &PropertyName> {
        self.managed.iter()
    }

    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Direct access for other writers sharing the registry. Writes made
    /// here bypass validation and are not tracked as managed.
    pub const fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Drain queued change events.
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    fn put(&mut self, name: &PropertyName, value: &PropertyValue) {
        self.registry.set(name, &value.render());
        self.managed.insert(name.clone());
    }

    fn remove_quiet(&mut self, name: &PropertyName) -> bool {
        self.managed.remove(name);
        self.registry.remove(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
