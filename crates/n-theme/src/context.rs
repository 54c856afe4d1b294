//! The engine context: documents, token index, and options for one
//! configuration version.
//!
//! A `Context` is owned by whoever drives the engine (the CLI, a test, the
//! watcher). Nothing is global. Mutation means replacing a document, which
//! rebuilds the index in the same call.

use std::path::Path;

use n_token::{Document, Mode, Resolver, TokenIndex};

use crate::error::Result;
use crate::options::EngineOptions;

#[derive(Debug)]
pub struct Context {
    tokens: Document,
    theme: Document,
    ui_kit: Document,
    index: TokenIndex,
    options: EngineOptions,
}

impl Context {
    #[must_use]
    pub fn new(tokens: Document, theme: Document, ui_kit: Document, options: EngineOptions) -> Self {
        let index = TokenIndex::from_document(&tokens);
        Self {
            tokens,
            theme,
            ui_kit,
            index,
            options,
        }
    }

    /// Load the three documents from disk. Without a UI-kit path an empty
    /// UI-kit document is used.
    ///
    /// # Errors
    ///
    /// Returns the first document that can't be read or parsed.
    pub fn load(
        tokens: &Path,
        theme: &Path,
        ui_kit: Option<&Path>,
        options: EngineOptions,
    ) -> Result<Self> {
        let tokens = Document::load(tokens)?;
        let theme = Document::load(theme)?;
        let ui_kit = match ui_kit {
            Some(path) => Document::load(path)?,
            None => Document::empty("ui-kit"),
        };
        Ok(Self::new(tokens, theme, ui_kit, options))
    }

    #[must_use]
    pub const fn tokens(&self) -> &Document {
        &self.tokens
    }

    #[must_use]
    pub const fn theme(&self) -> &Document {
        &self.theme
    }

    #[must_use]
    pub const fn ui_kit(&self) -> &Document {
        &self.ui_kit
    }

    #[must_use]
    pub const fn index(&self) -> &TokenIndex {
        &self.index
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// A resolver for `mode` honoring the configured depth bound.
    #[must_use]
    pub fn resolver(&self, mode: Mode) -> Resolver<'_> {
        Resolver::new(&self.index, &self.theme, mode).with_max_depth(self.options.max_reference_depth)
    }

    /// Modes the theme document declares, in [`Mode::ALL`] order.
    #[must_use]
    pub fn modes(&self) -> Vec<Mode> {
        Mode::ALL
            .into_iter()
            .filter(|m| self.theme.get(&["themes", m.as_str()]).is_some())
            .collect()
    }

    pub fn replace_tokens(&mut self, tokens: Document) {
        self.index = TokenIndex::from_document(&tokens);
        self.tokens = tokens;
    }

    pub fn replace_theme(&mut self, theme: Document) {
        self.theme = theme;
    }

    pub fn replace_ui_kit(&mut self, ui_kit: Document) {
        self.ui_kit = ui_kit;
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_token::{Level, TokenPath};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(name: &str, value: serde_json::Value) -> Document {
        Document::from_value(name, value).unwrap()
    }

    #[test]
    fn modes_follow_theme_document() {
        let ctx = Context::new(
            Document::empty("tokens"),
            doc("theme", json!({ "themes": { "dark": {} } })),
            Document::empty("ui-kit"),
            EngineOptions::default(),
        );
        assert_eq!(ctx.modes(), vec![Mode::Dark]);
    }

    #[test]
    fn replacing_tokens_rebuilds_index() {
        let mut ctx = Context::new(
            doc("tokens", json!({ "color": { "gray": { "500": { "$value": "#808080" } } } })),
            Document::empty("theme"),
            Document::empty("ui-kit"),
            EngineOptions::default(),
        );
        let path = TokenPath::color("gray", Level::new(500));
        assert!(ctx.index().get(&path).is_some());

        let mut tokens = ctx.tokens().clone();
        tokens.remove(&["color", "gray", "500"]);
        ctx.replace_tokens(tokens);
        assert!(ctx.index().get(&path).is_none());
    }
}
