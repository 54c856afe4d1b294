//! The reference grammar — `{dot.path}` pointers between documents.
//!
//! Every resolver consumes references through this one parser. The grammar:
//!
//! | Syntax                                                | Parsed as               |
//! |-------------------------------------------------------|-------------------------|
//! | `{tokens.color.<family>.<level>}`                     | [`Reference::Token`]    |
//! | `{tokens.color.<family>}`                             | [`Reference::Ramp`]     |
//! | `{tokens.<category>.<key…>}`                          | [`Reference::Token`]    |
//! | `{brand.themes.<mode>.palettes.<key>[.<level>]}`      | [`BrandRef::Palette`]   |
//! | `{brand.themes.<mode>.core-colors.<name>[.<state>]}`  | [`BrandRef::Core`]      |
//! | `{brand.themes.<mode>.layers.<layer>.surface}`        | [`BrandRef::Surface`]   |
//! | the same three without `themes.<mode>`                | mode taken from context |
//! | `{brand.<subsystem>.<path…>}`                         | [`Reference::Property`] |
//! | anything else                                         | [`Reference::Unresolved`] |
//!
//! [`Resolver`] follows brand references through the theme document until a
//! token or ramp is reached. It never substitutes a literal for a failed
//! lookup; the caller gets a [`ReferenceError`] and picks its own fallback.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;
use crate::index::{Level, TokenIndex, TokenPath};
use crate::name::{Mode, Subsystem};

static REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\s*([A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*)\s*\}$")
        .expect("reference pattern is valid")
});

/// Depth bound for transitive resolution when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Core colors, states, layers
// ---------------------------------------------------------------------------

/// The fixed set of semantic color anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoreColor {
    Black,
    White,
    Alert,
    Warning,
    Success,
    Interactive,
}

impl CoreColor {
    pub const ALL: [Self; 6] = [
        Self::Black,
        Self::White,
        Self::Alert,
        Self::Warning,
        Self::Success,
        Self::Interactive,
    ];

    /// The status anchors that get a text color on every layer.
    pub const STATUS: [Self; 3] = [Self::Alert, Self::Warning, Self::Success];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
            Self::Alert => "alert",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Interactive => "interactive",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for CoreColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-state of the `interactive` anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractiveState {
    Default,
    Hover,
}

impl InteractiveState {
    pub const ALL: [Self; 2] = [Self::Default, Self::Hover];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Hover => "hover",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// A surface layer: `layer-<n>` or a named alternative layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    Index(u16),
    Alternative(String),
}

impl LayerId {
    /// Parse a `layer-<n>` key.
    #[must_use]
    pub fn parse_indexed(s: &str) -> Option<Self> {
        let n = s.strip_prefix("layer-")?;
        if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        n.parse().ok().map(Self::Index)
    }

    /// Segments of this layer's node under `layers` in the theme document.
    #[must_use]
    pub fn doc_path(&self) -> Vec<String> {
        match self {
            Self::Index(n) => vec![format!("layer-{n}")],
            Self::Alternative(name) => vec!["alternative".to_string(), name.clone()],
        }
    }

    /// Segments used in brand property names (`layer-<segments>-…`).
    #[must_use]
    pub fn name_segments(&self) -> Vec<String> {
        match self {
            Self::Index(n) => vec![n.to_string()],
            Self::Alternative(name) => vec!["alternative".to_string(), name.clone()],
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "layer-{n}"),
            Self::Alternative(name) => write!(f, "alternative/{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// A pointer into the theme document. `mode: None` means "the mode of the
/// resolving context".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BrandRef {
    Palette {
        mode: Option<Mode>,
        key: String,
        level: Option<Level>,
    },
    Core {
        mode: Option<Mode>,
        color: CoreColor,
        state: Option<InteractiveState>,
    },
    Surface {
        mode: Option<Mode>,
        layer: LayerId,
    },
}

/// A parsed `{dot.path}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Token(TokenPath),
    Ramp(String),
    Brand(BrandRef),
    /// A mode-less pointer at an emitted brand property (UI-kit bindings).
    Property {
        subsystem: Subsystem,
        path: Vec<String>,
    },
    Unresolved(String),
}

impl Reference {
    /// Parse reference text. Never fails: unrecognized input comes back as
    /// [`Reference::Unresolved`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Some(caps) = REF_RE.captures(text.trim()) else {
            return Self::Unresolved(text.to_string());
        };
        let segments: Vec<&str> = caps[1].split('.').collect();
        parse_segments(&segments).unwrap_or_else(|| Self::Unresolved(text.to_string()))
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved(_))
    }
}

fn parse_segments(segments: &[&str]) -> Option<Reference> {
    match segments {
        ["tokens", "color", family, level] => {
            Some(Reference::Token(TokenPath::color(family, Level::parse(level)?)))
        }
        ["tokens", "color", family] => Some(Reference::Ramp((*family).to_string())),
        ["tokens", category, rest @ ..] if !rest.is_empty() => {
            Some(Reference::Token(TokenPath::new(category, &rest.join("-"))))
        }
        ["brand", "themes", mode, rest @ ..] => {
            let mode = mode.parse().ok()?;
            parse_theme_ref(Some(mode), rest).map(Reference::Brand)
        }
        ["brand", rest @ ..] => parse_theme_ref(None, rest)
            .map(Reference::Brand)
            .or_else(|| match rest {
                [subsystem, path @ ..] if !path.is_empty() => Some(Reference::Property {
                    subsystem: Subsystem::parse(subsystem)?,
                    path: path.iter().map(|s| (*s).to_string()).collect(),
                }),
                _ => None,
            }),
        _ => None,
    }
}

fn parse_theme_ref(mode: Option<Mode>, segments: &[&str]) -> Option<BrandRef> {
    match segments {
        ["palettes", key] => Some(BrandRef::Palette {
            mode,
            key: (*key).to_string(),
            level: None,
        }),
        ["palettes", key, level] => Some(BrandRef::Palette {
            mode,
            key: (*key).to_string(),
            level: Some(Level::parse(level)?),
        }),
        ["core-colors", "interactive", state] => Some(BrandRef::Core {
            mode,
            color: CoreColor::Interactive,
            state: Some(InteractiveState::parse(state)?),
        }),
        ["core-colors", name] => Some(BrandRef::Core {
            mode,
            color: CoreColor::parse(name)?,
            state: None,
        }),
        ["layers", "alternative", name, "surface"] => Some(BrandRef::Surface {
            mode,
            layer: LayerId::Alternative((*name).to_string()),
        }),
        ["layers", layer, "surface"] => Some(BrandRef::Surface {
            mode,
            layer: LayerId::parse_indexed(layer)?,
        }),
        _ => None,
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(path) => {
                write!(f, "{{tokens.{}}}", path.segments().join("."))
            }
            Self::Ramp(family) => write!(f, "{{tokens.color.{family}}}"),
            Self::Brand(brand) => {
                let (mode, tail) = match brand {
                    BrandRef::Palette { mode, key, level } => {
                        let mut tail = format!("palettes.{key}");
                        if let Some(level) = level {
                            tail.push_str(&format!(".{level}"));
                        }
                        (*mode, tail)
                    }
                    BrandRef::Core { mode, color, state } => {
                        let mut tail = format!("core-colors.{color}");
                        if let Some(state) = state {
                            tail.push_str(&format!(".{}", state.as_str()));
                        }
                        (*mode, tail)
                    }
                    BrandRef::Surface { mode, layer } => {
                        (*mode, format!("layers.{}.surface", layer.doc_path().join(".")))
                    }
                };
                match mode {
                    Some(mode) => write!(f, "{{brand.themes.{mode}.{tail}}}"),
                    None => write!(f, "{{brand.{tail}}}"),
                }
            }
            Self::Property { subsystem, path } => {
                write!(f, "{{brand.{}.{}}}", subsystem.as_str(), path.join("."))
            }
            Self::Unresolved(raw) => f.write_str(raw),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// What a reference ultimately points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A single token, with any alias replaced by the canonical ramp name.
    Token(TokenPath),
    /// A whole color ramp, by canonical name.
    Ramp(String),
}

/// Why a reference did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("unrecognized reference {0:?}")]
    Unrecognized(String),

    #[error("no token at {0}")]
    UnknownToken(String),

    #[error("no color ramp named {0:?}")]
    UnknownRamp(String),

    #[error("theme has no binding at {0}")]
    MissingBinding(String),

    #[error("palette {0:?} must bind a color ramp")]
    PaletteNotARamp(String),

    #[error("reference cycle through {0}")]
    Cycle(String),

    #[error("reference chain deeper than {0}")]
    TooDeep(usize),

    #[error("{0} names an output property, not a document binding")]
    OutputProperty(String),
}

/// Resolves references against one token index, theme document, and mode.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a TokenIndex,
    theme: &'a Document,
    mode: Mode,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(index: &'a TokenIndex, theme: &'a Document, mode: Mode) -> Self {
        Self {
            index,
            theme,
            mode,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn index(&self) -> &'a TokenIndex {
        self.index
    }

    #[must_use]
    pub const fn theme(&self) -> &'a Document {
        self.theme
    }

    /// Parse and resolve reference text.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve_str(&self, text: &str) -> Result<Target, ReferenceError> {
        self.resolve(&Reference::parse(text))
    }

    /// Follow `reference` until it reaches a token or a ramp.
    ///
    /// # Errors
    ///
    /// Returns a [`ReferenceError`] for unrecognized syntax, dangling
    /// bindings, unknown tokens, cycles, and chains longer than the
    /// configured depth.
    pub fn resolve(&self, reference: &Reference) -> Result<Target, ReferenceError> {
        let mut seen: Vec<String> = Vec::new();
        let mut current = reference.clone();

        loop {
            match current {
                Reference::Token(path) => {
                    return self
                        .index
                        .canonicalize(&path)
                        .map(Target::Token)
                        .ok_or_else(|| ReferenceError::UnknownToken(path.to_string()));
                }
                Reference::Ramp(family) => {
                    return self
                        .index
                        .ramp(&family)
                        .map(|ramp| Target::Ramp(ramp.name().to_string()))
                        .ok_or(ReferenceError::UnknownRamp(family));
                }
                Reference::Unresolved(raw) => return Err(ReferenceError::Unrecognized(raw)),
                Reference::Property { .. } => {
                    return Err(ReferenceError::OutputProperty(current.to_string()));
                }
                Reference::Brand(ref brand) => {
                    let key = self.visit_key(brand);
                    if seen.contains(&key) {
                        return Err(ReferenceError::Cycle(key));
                    }
                    if seen.len() >= self.max_depth {
                        return Err(ReferenceError::TooDeep(self.max_depth));
                    }
                    let next = self.step(brand)?;
                    seen.push(key);
                    current = next;
                }
            }
        }
    }

    /// Resolve to a single token, rejecting ramp targets.
    ///
    /// # Errors
    ///
    /// As [`Resolver::resolve`], plus [`ReferenceError::UnknownToken`] when
    /// the reference lands on a whole ramp.
    pub fn resolve_token(&self, reference: &Reference) -> Result<TokenPath, ReferenceError> {
        match self.resolve(reference)? {
            Target::Token(path) => Ok(path),
            Target::Ramp(family) => Err(ReferenceError::UnknownToken(format!("color/{family}"))),
        }
    }

    /// Cycle-detection key with the context mode filled in, so a mode-less
    /// and an explicit pointer at the same node compare equal.
    fn visit_key(&self, brand: &BrandRef) -> String {
        let explicit = match brand.clone() {
            BrandRef::Palette { key, level, .. } => BrandRef::Palette {
                mode: Some(brand_mode(brand).unwrap_or(self.mode)),
                key,
                level,
            },
            BrandRef::Core { color, state, .. } => BrandRef::Core {
                mode: Some(brand_mode(brand).unwrap_or(self.mode)),
                color,
                state,
            },
            BrandRef::Surface { layer, .. } => BrandRef::Surface {
                mode: Some(brand_mode(brand).unwrap_or(self.mode)),
                layer,
            },
        };
        Reference::Brand(explicit).to_string()
    }

    /// One hop: the reference bound at a theme-document location.
    fn step(&self, brand: &BrandRef) -> Result<Reference, ReferenceError> {
        match brand {
            BrandRef::Palette { mode, key, level } => {
                let mode = mode.unwrap_or(self.mode);
                let node = ["themes", mode.as_str(), "palettes", key.as_str()];
                let family = match self.binding(&node)? {
                    Reference::Ramp(family) => family,
                    _ => return Err(ReferenceError::PaletteNotARamp(key.clone())),
                };
                let level = match level {
                    Some(level) => *level,
                    None => self
                        .theme
                        .get(&node)
                        .and_then(|n| n.get("$primary"))
                        .and_then(serde_json::Value::as_str)
                        .and_then(Level::parse)
                        .ok_or_else(|| {
                            ReferenceError::MissingBinding(format!("{}.$primary", node.join(".")))
                        })?,
                };
                Ok(Reference::Token(TokenPath::color(&family, level)))
            }
            BrandRef::Core { mode, color, state } => {
                let mode = mode.unwrap_or(self.mode);
                let mut node = vec!["themes", mode.as_str(), "core-colors", color.as_str()];
                if *color == CoreColor::Interactive {
                    node.push(state.unwrap_or(InteractiveState::Default).as_str());
                }
                self.binding(&node)
            }
            BrandRef::Surface { mode, layer } => {
                let mode = mode.unwrap_or(self.mode);
                let layer_path = layer.doc_path();
                let mut node = vec!["themes", mode.as_str(), "layers"];
                node.extend(layer_path.iter().map(String::as_str));
                node.push("surface");
                self.binding(&node)
            }
        }
    }

    fn binding(&self, node: &[&str]) -> Result<Reference, ReferenceError> {
        let text = self
            .theme
            .leaf_str(node)
            .ok_or_else(|| ReferenceError::MissingBinding(node.join(".")))?;
        Ok(Reference::parse(text))
    }
}

const fn brand_mode(brand: &BrandRef) -> Option<Mode> {
    match brand {
        BrandRef::Palette { mode, .. } | BrandRef::Core { mode, .. } | BrandRef::Surface { mode, .. } => {
            *mode
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
