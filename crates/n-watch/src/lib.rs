//! # n-watch — keeping the live registry compliant
//!
//! The engine computes a property map once; this crate keeps the registry
//! in line with it as tokens, themes, palettes, and live values change.
//!
//! ```text
//!   set_token / set_palette / …        notify / write_live / check
//!              │                                  │
//!              ▼                                  ▼
//!        Dirty flags ──────────► flush() ◄─── live roots
//!                                   │
//!                       compute ─► diff ─► DependencyGraph::affected
//!                                   │
//!                       PropertyStore (one write per affected name)
//!                                   │
//!                   validate() ─► live_issues ─► FixGuard ─► auto-fix
//! ```
//!
//! - [`watcher`]: the [`ComplianceWatcher`] and its batching flush
//! - [`graph`]: reverse derivation edges and the affected-set closure
//! - [`watch`]: explicit interest in palettes, surfaces, and core colors
//! - [`validation`]: live checks the computation can't see
//! - [`guard`]: cooldown and give-up memory for auto-fix passes
//! - [`dirty`]: what changed since the last flush

pub mod dirty;
pub mod graph;
pub mod guard;
pub mod validation;
pub mod watch;
pub mod watcher;

pub use dirty::Dirty;
pub use graph::DependencyGraph;
pub use guard::FixGuard;
pub use validation::{live_issues, measure_pair};
pub use watch::{WatchSet, WatchTarget};
pub use watcher::{ComplianceWatcher, FlushReport, ValidationOutcome};
