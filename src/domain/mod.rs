//! Domain layer: entities, mutations and errors.
//!
//! Kept free of storage, backend and UI concerns.
//!
//! - [`error`]: Error types and result alias
//! - [`item`]: Lists, tasks, ids and priorities
//! - [`mutation`]: Write operations sent to the data layer

pub mod error;
pub mod item;
pub mod mutation;

pub use error::{Result, TodoError};
pub use item::{Identified, ItemId, ItemKind, Priority, Task, TodoList};
pub use mutation::{BatchMutation, Mutation, OpId};
