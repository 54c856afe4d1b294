//! # n-token — token documents, lookup, and the reference grammar
//!
//! The input side of n-tone. Three JSON documents describe a design system:
//!
//! ```text
//! tokens.json   raw values: color ramps, sizes, opacities, font primitives
//!     │
//!     ▼
//! theme.json    brand bindings per mode: palettes, core colors, layers
//!     │
//!     ▼
//! ui-kit.json   component bindings pointing at brand properties
//! ```
//!
//! This crate turns them into typed pieces the resolvers can work with:
//!
//! - [`document`]: the JSON trees, path access, leaf walking, mutation
//! - [`index`]: the flattened path → value lookup and color ramps
//! - [`reference`]: the `{dot.path}` grammar and transitive resolution
//! - [`name`]: output property names (`--tokens-…`, `--brand-…`, `--ui-…`)
//! - [`value`]: output property values (literals, `var()`, `color-mix()`)

pub mod document;
pub mod error;
pub mod index;
pub mod name;
pub mod reference;
pub mod value;

pub use document::Document;
pub use error::{Result, TokenError};
pub use index::{Level, Ramp, TokenIndex, TokenPath, TokenValue};
pub use name::{Mode, PropertyName, Subsystem, Tier};
pub use reference::{
    BrandRef, CoreColor, InteractiveState, LayerId, Reference, ReferenceError, Resolver, Target,
};
pub use value::{Opacity, PropertyValue};
