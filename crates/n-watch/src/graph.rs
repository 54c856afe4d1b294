//! The dependency graph between properties.
//!
//! Built from the derivations a [`PropertyMap`] records: every derived
//! property lists its inputs, and the graph stores the reverse edges so a
//! change can be followed to everything downstream of it.
//!
//! ```text
//! --tokens-color-blue-500 ──► --brand-light-palettes-accent-500-tone
//!                                   │
//!                                   ├──► …-accent-500-on-tone
//!                                   └──► --brand-light-layer-2-surface
//!                                               ├──► …-layer-2-text
//!                                               └──► …-layer-2-interactive-default-tone ──► …-on-tone
//! ```
//!
//! [`DependencyGraph::affected`] is a breadth-first closure with a visited
//! set, so it terminates even if a malformed map ever recorded a cycle.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use n_theme::PropertyMap;
use n_token::PropertyName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// input → properties derived from it
    dependents: BTreeMap<PropertyName, BTreeSet<PropertyName>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn from_map(map: &PropertyMap) -> Self {
        let mut graph = Self::default();
        for (name, derivation) in map.derivations() {
            for input in &derivation.inputs {
                graph.add_edge(input.clone(), name.clone());
            }
        }
        graph
    }

    pub fn add_edge(&mut self, input: PropertyName, dependent: PropertyName) {
        self.dependents.entry(input).or_default().insert(dependent);
    }

    /// Direct dependents of `name`.
    pub fn dependents_of<'a>(&'a self, name: &PropertyName) -> impl Iterator<Item = &'a PropertyName> + 'a {
        self.dependents.get(name).into_iter().flatten()
    }

    /// Union of both graphs' edges.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (input, dependents) in &other.dependents {
            out.dependents
                .entry(input.clone())
                .or_default()
                .extend(dependents.iter().cloned());
        }
        out
    }

    /// `roots` plus everything transitively derived from them.
    #[must_use]
    pub fn affected<'a, I>(&self, roots: I) -> BTreeSet<PropertyName>
    where
        I: IntoIterator<Item = &'a PropertyName>,
    {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&PropertyName> = roots.into_iter().collect();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            queue.extend(self.dependents_of(name));
        }
        seen
    }

    /// Number of inputs with at least one dependent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
