//! # n-style — the live style registry and its write boundary
//!
//! Everything the engine computes ends up here, as custom properties on the
//! rendering surface. The registry is shared with whatever consumes the
//! styles, so every engine write goes through one [`PropertyStore`]:
//!
//! ```text
//! PropertyMap ──► PropertyStore ──► validator ──► StyleRegistry
//!                     │                 │              ▲
//!                     │           repair literal       │
//!                     │           via TokenIndex       │ eval (var / color-mix)
//!                     ▼                                │
//!               ChangeEvent queue              live value checks
//! ```
//!
//! - [`registry`]: the `get/set/remove/clear_all` seam and an in-memory
//!   implementation, plus stylesheet rendering
//! - [`validator`]: brand/UI-tier purity, with one reverse-lookup repair
//! - [`store`]: batch apply with partial-failure semantics, diff apply, clear
//! - [`eval`]: resolve a live property to a concrete color or number
//! - [`event`]: the change notifications exchanged with the outside world

pub mod eval;
pub mod event;
pub mod registry;
pub mod store;
pub mod validator;

pub use eval::{EvalError, eval_color, eval_number, eval_value};
pub use event::ChangeEvent;
pub use registry::{MemoryRegistry, StyleRegistry, stylesheet};
pub use store::{ApplyReport, PropertyStore};
pub use validator::{ValidationError, Verdict, validate};
