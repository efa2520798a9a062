//! The external data layer seen from the core.
//!
//! Implementations own the `lists` and `tasks` collections for the current
//! user. Every call is asynchronous; the core awaits them on a single-threaded
//! executor, so the returned futures are not required to be `Send`.

use crate::domain::error::Result;
use crate::domain::{BatchMutation, OpId, Task, TodoList};
use crate::search::{SearchHit, SearchRequest};
use crate::sync::{QueuedOperation, ReplayOutcome};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

/// Acknowledgement of an applied batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub batch_id: OpId,
    /// Mutations that changed something.
    pub applied: usize,
    /// Mutations whose target did not exist.
    pub skipped: usize,
}

/// CRUD, replay and search over the user's lists and tasks.
pub trait DataLayer {
    /// All lists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TodoError::Backend`] when the data layer is unreachable.
    fn load_lists(&self) -> LocalBoxFuture<'_, Result<Vec<TodoList>>>;

    /// All tasks across lists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TodoError::Backend`] when the data layer is unreachable.
    fn load_tasks(&self) -> LocalBoxFuture<'_, Result<Vec<Task>>>;

    /// Applies a batch atomically from the caller's point of view.
    ///
    /// Re-sending a batch id that was already applied returns the original
    /// receipt without applying it again.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TodoError::Backend`] when the data layer is unreachable.
    fn apply_batch(&self, batch: BatchMutation) -> LocalBoxFuture<'_, Result<BatchReceipt>>;

    /// Applies one queued operation, honouring its op id and base version.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TodoError::Backend`] when the data layer is
    /// unreachable. Rejections are reported as [`ReplayOutcome`] values.
    fn replay(&self, op: QueuedOperation) -> LocalBoxFuture<'_, Result<ReplayOutcome>>;

    /// Server-side search.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TodoError::Backend`] when the data layer is unreachable.
    fn search(&self, request: SearchRequest) -> LocalBoxFuture<'_, Result<Vec<SearchHit>>>;
}
