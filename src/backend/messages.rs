//! Serialized request/response protocol for reaching a data layer over a
//! message channel.
//!
//! A host that runs the data layer elsewhere (another thread, a worker, a
//! socket) exchanges these as JSON. [`super::BackendBridge`] is the receiving
//! end.

use super::data_layer::BatchReceipt;
use crate::domain::{BatchMutation, OpId, Task, TodoList};
use crate::search::{SearchHit, SearchRequest};
use crate::sync::{QueuedOperation, ReplayOutcome};
use serde::{Deserialize, Serialize};

/// Requests sent to the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendRequest {
    LoadLists,
    LoadTasks,
    /// Apply a bulk or import batch.
    ApplyBatch { batch: BatchMutation },
    /// Replay one operation from the offline queue.
    Replay { op: QueuedOperation },
    Search { request: SearchRequest },
}

impl BackendRequest {
    /// Short name used in logs and error messages.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::LoadLists => "load lists",
            Self::LoadTasks => "load tasks",
            Self::ApplyBatch { .. } => "apply batch",
            Self::Replay { .. } => "replay operation",
            Self::Search { .. } => "search",
        }
    }
}

/// Responses returned by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendResponse {
    ListsLoaded { lists: Vec<TodoList> },
    TasksLoaded { tasks: Vec<Task> },
    BatchApplied { receipt: BatchReceipt },
    Replayed { op_id: OpId, outcome: ReplayOutcome },
    SearchResults { hits: Vec<SearchHit> },
    /// The request failed; `message` names the operation and the cause.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_tagged_by_type() {
        let json = serde_json::to_value(BackendRequest::LoadTasks).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "load_tasks" }));

        let parsed: BackendRequest =
            serde_json::from_str(r#"{"type":"search","request":{"query":"milk"}}"#).unwrap();
        match parsed {
            BackendRequest::Search { request } => {
                assert_eq!(request.query, "milk");
                assert_eq!(request.options.limit, crate::search::query::DEFAULT_LIMIT);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }
}
