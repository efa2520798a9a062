//! Side effects requested by the event handler.
//!
//! The handler never awaits anything. It returns a `Vec<Action>` and the
//! runtime performs each one, feeding results back in as events:
//!
//! ```text
//! LoadData        -> Event::DataLoaded | Event::LoadFailed
//! SendBatch       -> Event::BatchApplied | Event::BatchFailed
//! RunSearch       -> Event::SearchCompleted
//! ReplayQueue     -> Event::ReplayFinished
//! ```

use crate::domain::BatchMutation;
use crate::search::PendingSearch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Stop the event loop.
    Quit,

    /// Fetch lists and tasks from the data layer.
    LoadData,

    /// Apply a batch through the data layer.
    SendBatch(BatchMutation),

    /// Run a debounced server search.
    RunSearch(PendingSearch),

    /// Replay ready operations from the offline queue.
    ReplayQueue,

    /// Write the offline queue to local storage.
    PersistQueue,

    /// Write the recent-searches list to local storage.
    PersistRecent,
}
