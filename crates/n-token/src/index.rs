//! Token index — the raw token document flattened into a lookup table.
//!
//! Built once per document version in a single pass. Every token is keyed
//! by a [`TokenPath`] (`category/key` or `color/family/level`); lookups are
//! hash lookups after construction. Color tokens are additionally grouped
//! into [`Ramp`]s, the ordered level sets the stepping engine walks.
//!
//! Tokens that fail validation (a color that isn't `#rgb`/`#rrggbb` hex, an opacity
//! outside `[0, 1]`, a level key that isn't numeric) are skipped and
//! recorded in [`TokenIndex::rejected`]. They are never defaulted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use n_color::Color;
use serde_json::Value;

use crate::document::Document;
use crate::error::TokenError;
use crate::name::PropertyName;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A ramp level such as `000`, `050`, `500`, `1000`.
///
/// Larger levels are darker. Displayed zero-padded to three digits, which is
/// also how levels are spelled in token documents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(u16);

impl Level {
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Parse a level key. Only ASCII digits are accepted.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(Self)
    }

    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({self})")
    }
}

// ---------------------------------------------------------------------------
// TokenPath
// ---------------------------------------------------------------------------

/// Address of one token: `category/key` or `color/family/level`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPath {
    pub category: String,
    pub key: String,
    pub level: Option<Level>,
}

impl TokenPath {
    /// A non-color token (`size/md`, `opacity/high`, …).
    #[must_use]
    pub fn new(category: &str, key: &str) -> Self {
        Self {
            category: category.to_string(),
            key: key.to_string(),
            level: None,
        }
    }

    /// A color token inside a ramp.
    #[must_use]
    pub fn color(family: &str, level: Level) -> Self {
        Self {
            category: COLOR.to_string(),
            key: family.to_string(),
            level: Some(level),
        }
    }

    #[must_use]
    pub fn is_color(&self) -> bool {
        self.category == COLOR
    }

    /// Path segments, as used in property names.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        let mut out = vec![self.category.clone(), self.key.clone()];
        if let Some(level) = self.level {
            out.push(level.to_string());
        }
        out
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

const COLOR: &str = "color";

// ---------------------------------------------------------------------------
// TokenValue
// ---------------------------------------------------------------------------

/// A resolved token leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Color(Color),
    /// A length in px (`size`, `font-size`).
    Dimension(f64),
    /// A unit-less number (`opacity`, `font-weight`, `line-height`).
    Number(f64),
    /// Free text (`font-family`).
    Text(String),
}

impl TokenValue {
    /// The literal written to the rendering surface.
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::Color(c) => c.to_hex(),
            Self::Dimension(px) => format!("{}px", format_number(*px)),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }

    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::Dimension(n) => Some(*n),
            _ => None,
        }
    }
}

/// Shortest decimal form of a number: `16` not `16.0`, `0.87` as is.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Ramp
// ---------------------------------------------------------------------------

/// An ordered, named set of color tokens at discrete levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ramp {
    name: String,
    alias: Option<String>,
    scale: Option<String>,
    levels: BTreeMap<Level, Color>,
}

impl Ramp {
    /// Build a ramp from level/color pairs.
    #[must_use]
    pub fn new(name: &str, levels: impl IntoIterator<Item = (Level, Color)>) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            scale: None,
            levels: levels.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The canonical scale id; defaults to the ramp name.
    #[must_use]
    pub fn scale(&self) -> &str {
        self.scale.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn color(&self, level: Level) -> Option<Color> {
        self.levels.get(&level).copied()
    }

    /// Levels in ascending (lightest → darkest) order.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of `level` in ascending order.
    #[must_use]
    pub fn position(&self, level: Level) -> Option<usize> {
        self.levels.keys().position(|l| *l == level)
    }

    /// Level at ascending index `idx`.
    #[must_use]
    pub fn level_at(&self, idx: usize) -> Option<Level> {
        self.levels.keys().nth(idx).copied()
    }

    /// The existing level closest to `level`, ties going to the lighter one.
    #[must_use]
    pub fn nearest(&self, level: Level) -> Option<Level> {
        self.levels
            .keys()
            .copied()
            .min_by_key(|l| (l.value().abs_diff(level.value()), l.value()))
    }

    #[must_use]
    pub fn token(&self, level: Level) -> TokenPath {
        TokenPath::color(&self.name, level)
    }
}

// ---------------------------------------------------------------------------
// TokenIndex
// ---------------------------------------------------------------------------

/// Flattened lookup over a raw token document.
#[derive(Debug, Default)]
pub struct TokenIndex {
    values: HashMap<TokenPath, TokenValue>,
    order: Vec<TokenPath>,
    ramps: BTreeMap<String, Ramp>,
    aliases: HashMap<String, String>,
    by_color: HashMap<Color, TokenPath>,
    by_property: HashMap<PropertyName, TokenPath>,
    rejected: Vec<TokenError>,
}

impl TokenIndex {
    /// Index every token in `doc`.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let mut index = Self::default();

        for category in doc.keys(&[]) {
            if category == COLOR {
                for family in doc.keys(&[COLOR]) {
                    index.add_ramp(doc, &family);
                }
            } else {
                for leaf in doc.leaves(&[&category]) {
                    let key = leaf.path[1..].join("-");
                    let path = TokenPath::new(&category, &key);
                    match scalar_value(&category, leaf.kind, leaf.value) {
                        Ok(value) => index.insert(path, value),
                        Err(reason) => index.reject(&path, reason),
                    }
                }
            }
        }

        index.order = index.values.keys().cloned().collect();
        index.order.sort();
        for path in &index.order {
            if let Some(TokenValue::Color(c)) = index.values.get(path) {
                index.by_color.entry(*c).or_insert_with(|| path.clone());
            }
            index.by_property.insert(PropertyName::token(path), path.clone());
        }

        tracing::debug!(
            tokens = index.order.len(),
            ramps = index.ramps.len(),
            rejected = index.rejected.len(),
            "token index built"
        );
        index
    }

    fn add_ramp(&mut self, doc: &Document, family: &str) {
        let meta = |key: &str| {
            doc.get(&[COLOR, family, key])
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let mut levels = BTreeMap::new();

        for key in doc.keys(&[COLOR, family]) {
            let shown = format!("{COLOR}/{family}/{key}");
            let Some(level) = Level::parse(&key) else {
                tracing::warn!(token = %shown, "ramp level must be numeric");
                self.rejected.push(TokenError::InvalidToken {
                    path: shown,
                    reason: "ramp level must be numeric".to_string(),
                });
                continue;
            };
            let path = TokenPath::color(family, level);
            match doc.leaf_str(&[COLOR, family, &key]).and_then(Color::hex) {
                Some(color) => {
                    levels.insert(level, color);
                    self.insert(path, TokenValue::Color(color));
                }
                None => self.reject(&path, "color must be #rgb or #rrggbb hex".to_string()),
            }
        }

        let mut ramp = Ramp::new(family, levels);
        ramp.scale = meta("$scale");
        if let Some(alias) = meta("$alias") {
            self.aliases.insert(alias.clone(), family.to_string());
            ramp.alias = Some(alias);
        }
        self.ramps.insert(family.to_string(), ramp);
    }

    fn insert(&mut self, path: TokenPath, value: TokenValue) {
        self.values.insert(path, value);
    }

    fn reject(&mut self, path: &TokenPath, reason: String) {
        tracing::warn!(token = %path, %reason, "token rejected");
        self.rejected.push(TokenError::InvalidToken {
            path: path.to_string(),
            reason,
        });
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    /// Value at `path`. Color paths may name a ramp by its alias.
    #[must_use]
    pub fn get(&self, path: &TokenPath) -> Option<&TokenValue> {
        self.values
            .get(path)
            .or_else(|| self.canonicalize(path).and_then(|p| self.values.get(&p)))
    }

    /// Color value at `path`.
    #[must_use]
    pub fn color(&self, path: &TokenPath) -> Option<Color> {
        self.get(path).and_then(TokenValue::as_color)
    }

    /// Replace an alias family with its canonical ramp name. Returns `None`
    /// when the path names no known token.
    #[must_use]
    pub fn canonicalize(&self, path: &TokenPath) -> Option<TokenPath> {
        if self.values.contains_key(path) {
            return Some(path.clone());
        }
        if !path.is_color() {
            return None;
        }
        let family = self.aliases.get(&path.key)?;
        let canonical = TokenPath {
            key: family.clone(),
            ..path.clone()
        };
        self.values.contains_key(&canonical).then_some(canonical)
    }

    /// Token published under the token-tier property `name`.
    #[must_use]
    pub fn path_of(&self, name: &PropertyName) -> Option<&TokenPath> {
        self.by_property.get(name)
    }

    /// Ramp by name or alias.
    #[must_use]
    pub fn ramp(&self, name: &str) -> Option<&Ramp> {
        self.ramps
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|n| self.ramps.get(n)))
    }

    /// All ramps, by name.
    pub fn ramps(&self) -> impl Iterator<Item = &Ramp> {
        self.ramps.values()
    }

    /// Every token in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&TokenPath, &TokenValue)> {
        self.order
            .iter()
            .filter_map(|p| self.values.get(p).map(|v| (p, v)))
    }

    /// First color token (in path order) whose value is exactly `color`.
    #[must_use]
    pub fn find_color(&self, color: Color) -> Option<&TokenPath> {
        self.by_color.get(&color)
    }

    /// First numeric token (in path order) equal to `value`. With
    /// `dimension` set only px tokens match, otherwise only unit-less ones.
    #[must_use]
    pub fn find_number(&self, value: f64, dimension: bool) -> Option<&TokenPath> {
        self.iter().find_map(|(path, v)| {
            let hit = match v {
                TokenValue::Dimension(n) => dimension && (n - value).abs() < 1e-9,
                TokenValue::Number(n) => !dimension && (n - value).abs() < 1e-9,
                _ => false,
            };
            hit.then_some(path)
        })
    }

    /// Tokens skipped during indexing.
    #[must_use]
    pub fn rejected(&self) -> &[TokenError] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn scalar_value(category: &str, kind: Option<&str>, value: &Value) -> Result<TokenValue, String> {
    let dimension = matches!(category, "size" | "font-size" | "dimension")
        || matches!(kind, Some("dimension" | "size"));

    match value {
        Value::Number(n) => {
            let n = n.as_f64().ok_or_else(|| "number out of range".to_string())?;
            if category == "opacity" && !(0.0..=1.0).contains(&n) {
                return Err(format!("opacity {n} outside [0, 1]"));
            }
            if dimension {
                Ok(TokenValue::Dimension(n))
            } else {
                Ok(TokenValue::Number(n))
            }
        }
        Value::String(s) if dimension => s
            .trim()
            .strip_suffix("px")
            .and_then(|n| n.trim().parse().ok())
            .map(TokenValue::Dimension)
            .ok_or_else(|| format!("dimension {s:?} is not a px value")),
        Value::String(s) if kind == Some("color") => Color::hex(s)
            .map(TokenValue::Color)
            .ok_or_else(|| "color must be #rgb or #rrggbb hex".to_string()),
        Value::String(s) => Ok(TokenValue::Text(s.clone())),
        other => Err(format!("unsupported token value {other}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
