//! Engine options.
//!
//! Read from a JSON object with kebab-case keys. Every key is optional:
//!
//! | Key                   | Type           | Default |
//! |-----------------------|----------------|---------|
//! | `text-emphasis`       | reference text | none    |
//! | `max-reference-depth` | integer        | 8       |
//! | `fix-cooldown-ms`     | integer        | 1000    |
//! | `ui-kit-mode`         | `light`/`dark` | `light` |
//!
//! `text-emphasis` overrides the theme's own `text-emphasis` binding. With
//! neither present, text is written at full opacity.

use std::path::Path;
use std::time::Duration;

use n_token::Mode;
use n_token::reference::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThemeError};

pub const DEFAULT_FIX_COOLDOWN_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineOptions {
    pub text_emphasis: Option<String>,
    pub max_reference_depth: usize,
    pub fix_cooldown_ms: u64,
    pub ui_kit_mode: Mode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            text_emphasis: None,
            max_reference_depth: DEFAULT_MAX_DEPTH,
            fix_cooldown_ms: DEFAULT_FIX_COOLDOWN_MS,
            ui_kit_mode: Mode::Light,
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON text. `name` labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Options`] for malformed JSON, unknown keys, or
    /// values of the wrong type.
    pub fn from_json(name: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| ThemeError::Options {
            name: name.to_string(),
            source,
        })
    }

    /// Read and parse an options file.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Io`] when the file can't be read, otherwise as
    /// [`EngineOptions::from_json`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &text)
    }

    #[must_use]
    pub const fn fix_cooldown(&self) -> Duration {
        Duration::from_millis(self.fix_cooldown_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
