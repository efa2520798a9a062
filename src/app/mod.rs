//! Application layer coordinating state, events, and actions.
//!
//! This module sits between a frontend (the shell binary, or any UI that
//! embeds the crate) and the domain, search, selection and sync layers.
//!
//! # Architecture
//!
//! ```text
//! Key / Backend answer → Event → handle_event → State mutations → Actions
//!                          ↑                                         ↓
//!                          └──────────── Runtime::execute ───────────┘
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects emitted by the event handler
//! - [`clock`]: Monotonic and wall-clock time passed to the handler
//! - [`handler`]: Event processing and state transitions
//! - [`keymap`]: Commands and their default key bindings
//! - [`modes`]: Input and view mode types
//! - [`runtime`]: Action executor backed by a data layer and a local store
//! - [`state`]: Central state container and view model computation
//! - [`viewmodel`]: Display-ready view model types

pub mod actions;
pub mod clock;
pub mod handler;
pub mod keymap;
pub mod modes;
pub mod runtime;
pub mod state;
pub mod viewmodel;

pub use actions::Action;
pub use clock::Clock;
pub use handler::{handle_event, Event};
pub use keymap::{default_registry, Command, RESULTS_CONTEXT, SEARCH_CONTEXT, SELECTION_CONTEXT};
pub use modes::{InputMode, SearchFocus, ViewMode};
pub use runtime::Runtime;
pub use state::AppState;
pub use viewmodel::ViewModel;
