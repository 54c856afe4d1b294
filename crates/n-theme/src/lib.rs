//! # n-theme — token resolution and contrast enforcement
//!
//! Turns a [`Context`] (token, theme, and UI-kit documents plus options)
//! into a flat [`PropertyMap`] in which every derived foreground color
//! meets WCAG AA against its background, or is reported.
//!
//! # Architecture
//!
//! ```text
//! Context (documents + TokenIndex + EngineOptions)
//!     │
//!     ▼
//! anchor.rs:  resolve black/white/status/interactive anchors per mode
//!     │
//!     ▼
//! palette.rs: tone / on-tone per palette level
//!     │
//!     ▼
//! layer.rs:   surface → text, interactive, status colors
//!     │         └── step.rs: alternating ramp search until AA
//!     ▼
//! engine.rs:  assemble PropertyMap + ComplianceIssues
//! ```
//!
//! # Purity
//!
//! Brand-tier values are always references to token-tier properties or
//! `color-mix` blends of them. No resolver writes a literal color outside
//! the token tier, and no failed lookup is replaced by an arbitrary
//! literal: failures become [`ComplianceIssue`]s with a named fallback.

// Builders for JSON presets and resolver passes read best as one function.
#![allow(clippy::too_many_lines)]

pub mod anchor;
pub mod builtin;
pub mod context;
pub mod engine;
pub mod error;
pub mod issue;
pub mod layer;
pub mod map;
pub mod options;
pub mod palette;
pub mod step;

pub use context::Context;
pub use engine::{Computation, compute};
pub use error::{Result, ThemeError};
pub use issue::{ComplianceIssue, ComplianceReport, IssueKind, Severity};
pub use map::{Binding, Derivation, MapDiff, PropertyMap};
pub use options::EngineOptions;
