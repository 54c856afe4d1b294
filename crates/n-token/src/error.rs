//! Errors for loading and indexing token documents.

use std::path::PathBuf;

/// Failure while reading a document or indexing one of its tokens.
///
/// Only document loading returns these as `Err`. Per-token problems found
/// while indexing are collected on the [`TokenIndex`](crate::TokenIndex)
/// instead, so one bad token never hides the rest of the document.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name}: top level must be an object")]
    NotAnObject { name: String },

    #[error("token {path}: {reason}")]
    InvalidToken { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TokenError>;
