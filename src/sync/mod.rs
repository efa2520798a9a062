//! Offline mutation queue and replay.
//!
//! - [`queue`]: Durable queue, backoff, dead letters and conflicts
//! - [`replay`]: Driving ready operations through a [`crate::backend::DataLayer`]

pub mod queue;
pub mod replay;

pub use queue::{
    ConflictChoice, ConflictPolicy, ConflictRecord, Disposition, OfflineQueue, QueueConfig, QueuedOperation,
    ReplayOutcome,
};
pub use replay::{replay_ready, ReplayReport};
