//! Bulk-selection state machine.
//!
//! - [`reducer`]: Pure `(state, action) -> state` transitions
//! - [`store`]: Method-style store owned by a view
//! - [`bulk`]: Toolbar actions turned into batched mutations

pub mod bulk;
pub mod reducer;
pub mod store;

pub use bulk::{plan_bulk, BulkAction};
pub use reducer::{reduce, SelectionAction, SelectionPhase, SelectionState};
pub use store::SelectionStore;
