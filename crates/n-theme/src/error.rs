//! Errors for loading engine inputs.

use std::path::PathBuf;

use n_token::TokenError;

/// Failure while loading options or documents for the engine.
///
/// Resolution never fails with this type: reference failures and contrast
/// problems are reported as [`ComplianceIssue`](crate::ComplianceIssue)s.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options in {name}: {source}")]
    Options {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type Result<T> = std::result::Result<T, ThemeError>;
