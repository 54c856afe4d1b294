//! JSON documents — the raw input trees.
//!
//! A [`Document`] is a nested JSON object whose leaves are objects carrying
//! a `$value` (and optionally `$type`). Keys starting with `$` are metadata
//! and never part of a path. Documents are plain values: the engine clones
//! one before mutating it, so every resolver pass reads an immutable
//! snapshot.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Result, TokenError};

/// One input document (tokens, theme, or UI kit).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    root: Value,
}

/// A leaf found while walking a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    /// Path segments from the root to the leaf object.
    pub path: Vec<String>,
    /// The `$value` payload.
    pub value: &'a Value,
    /// The `$type` annotation, when present.
    pub kind: Option<&'a str>,
}

impl Document {
    /// An empty document (`{}`).
    #[must_use]
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: Value::Object(Map::new()),
        }
    }

    /// Wrap an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::NotAnObject`] unless the value is an object.
    pub fn from_value(name: &str, root: Value) -> Result<Self> {
        if !root.is_object() {
            return Err(TokenError::NotAnObject { name: name.to_string() });
        }
        Ok(Self { name: name.to_string(), root })
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Json`] for malformed JSON and
    /// [`TokenError::NotAnObject`] when the top level is not an object.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let root = serde_json::from_str(text).map_err(|source| TokenError::Json {
            name: name.to_string(),
            source,
        })?;
        Self::from_value(name, root)
    }

    /// Read and parse a document from disk. The file name becomes the
    /// document name.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Io`] when the file can't be read, otherwise as
    /// [`Document::parse`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TokenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// The document's name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The whole JSON tree.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Node at `path`, if every segment exists.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.root, |node, key| node.get(*key))
    }

    /// The `$value` of the leaf at `path`.
    #[must_use]
    pub fn leaf_value(&self, path: &[&str]) -> Option<&Value> {
        self.get(path).and_then(|node| node.get("$value"))
    }

    /// The `$value` of the leaf at `path` as a string.
    #[must_use]
    pub fn leaf_str(&self, path: &[&str]) -> Option<&str> {
        self.leaf_value(path).and_then(Value::as_str)
    }

    /// Child keys of the object at `path`, metadata keys excluded, in
    /// document order.
    #[must_use]
    pub fn keys(&self, path: &[&str]) -> Vec<String> {
        match self.get(path) {
            Some(Value::Object(map)) => map
                .keys()
                .filter(|k| !k.starts_with('$'))
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every leaf under `path`, depth-first in document order.
    #[must_use]
    pub fn leaves(&self, path: &[&str]) -> Vec<Leaf<'_>> {
        let mut out = Vec::new();
        if let Some(node) = self.get(path) {
            let mut prefix: Vec<String> = path.iter().map(|s| (*s).to_string()).collect();
            collect_leaves(node, &mut prefix, &mut out);
        }
        out
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Set the `$value` of the leaf at `path`, creating intermediate objects
    /// as needed. Any existing `$type` on the leaf is kept.
    pub fn set_leaf(&mut self, path: &[&str], value: Value) {
        if let Some(node) = self.ensure_object(path) {
            node.insert("$value".to_string(), value);
        }
    }

    /// Replace the node at `path` wholesale, creating parents as needed.
    pub fn set_node(&mut self, path: &[&str], node: Value) {
        let Some((last, parents)) = path.split_last() else {
            if node.is_object() {
                self.root = node;
            }
            return;
        };
        if let Some(parent) = self.ensure_object(parents) {
            parent.insert((*last).to_string(), node);
        }
    }

    /// Remove the node at `path`. Returns the removed node.
    pub fn remove(&mut self, path: &[&str]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut node = &mut self.root;
        for key in parents {
            node = node.get_mut(*key)?;
        }
        node.as_object_mut()?.shift_remove(*last)
    }

    fn ensure_object(&mut self, path: &[&str]) -> Option<&mut Map<String, Value>> {
        let mut node = &mut self.root;
        for key in path {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = node
                .as_object_mut()?
                .entry(*key)
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node.as_object_mut()
    }
}

fn collect_leaves<'a>(node: &'a Value, prefix: &mut Vec<String>, out: &mut Vec<Leaf<'a>>) {
    let Value::Object(map) = node else { return };
    if let Some(value) = map.get("$value") {
        out.push(Leaf {
            path: prefix.clone(),
            value,
            kind: map.get("$type").and_then(Value::as_str),
        });
        return;
    }
    for (key, child) in map {
        if key.starts_with('$') {
            continue;
        }
        prefix.push(key.clone());
        collect_leaves(child, prefix, out);
        prefix.pop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(
            "tokens",
            json!({
                "color": {
                    "gray": {
                        "$alias": "neutral",
                        "000": { "$value": "#ffffff", "$type": "color" },
                        "900": { "$value": "#000000" }
                    }
                },
                "size": { "sm": { "$value": 4 } }
            }),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_object() {
        let err = Document::from_value("x", json!([1, 2])).unwrap_err();
        assert!(matches!(err, TokenError::NotAnObject { .. }));
    }

    #[test]
    fn parse_reports_bad_json() {
        let err = Document::parse("broken", "{ nope").unwrap_err();
        assert!(matches!(err, TokenError::Json { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn path_access() {
        let d = doc();
        assert_eq!(d.leaf_str(&["color", "gray", "000"]), Some("#ffffff"));
        assert_eq!(d.leaf_value(&["size", "sm"]), Some(&json!(4)));
        assert_eq!(d.get(&["color", "red"]), None);
    }

    #[test]
    fn keys_skip_metadata() {
        assert_eq!(doc().keys(&["color", "gray"]), vec!["000".to_string(), "900".to_string()]);
    }

    #[test]
    fn leaves_walk_in_order() {
        let d = doc();
        let leaves = d.leaves(&[]);
        let paths: Vec<String> = leaves.iter().map(|l| l.path.join("/")).collect();
        assert_eq!(paths, vec!["color/gray/000", "color/gray/900", "size/sm"]);
        assert_eq!(leaves[0].kind, Some("color"));
        assert_eq!(leaves[1].kind, None);
    }

    #[test]
    fn set_leaf_creates_parents_and_keeps_type() {
        let mut d = doc();
        d.set_leaf(&["color", "gray", "000"], json!("#fefefe"));
        d.set_leaf(&["color", "red", "500"], json!("#ff0000"));
        assert_eq!(d.leaf_str(&["color", "gray", "000"]), Some("#fefefe"));
        assert_eq!(d.get(&["color", "gray", "000", "$type"]), Some(&json!("color")));
        assert_eq!(d.leaf_str(&["color", "red", "500"]), Some("#ff0000"));
    }

    #[test]
    fn remove_returns_node() {
        let mut d = doc();
        let removed = d.remove(&["size", "sm"]);
        assert_eq!(removed, Some(json!({ "$value": 4 })));
        assert_eq!(d.get(&["size", "sm"]), None);
        assert_eq!(d.remove(&["size", "sm"]), None);
    }

    #[test]
    fn clones_are_independent() {
        let original = doc();
        let mut copy = original.clone();
        copy.set_leaf(&["size", "sm"], json!(8));
        assert_eq!(original.leaf_value(&["size", "sm"]), Some(&json!(4)));
    }
}
