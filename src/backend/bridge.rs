//! Receiving end of the backend message protocol.

use super::data_layer::DataLayer;
use super::messages::{BackendRequest, BackendResponse};
use crate::domain::error::Result;
use std::rc::Rc;

/// Dispatches [`BackendRequest`]s to a [`DataLayer`] and wraps the answers.
///
/// Failures never escape as `Err`: they become [`BackendResponse::Error`]
/// carrying the operation name and cause.
pub struct BackendBridge<D: DataLayer> {
    data: Rc<D>,
}

impl<D: DataLayer> BackendBridge<D> {
    pub const fn new(data: Rc<D>) -> Self {
        Self { data }
    }

    /// Maps a data-layer result to a response with consistent logging.
    fn handle_result<T, F>(operation: &str, result: Result<T>, on_success: F) -> BackendResponse
    where
        F: FnOnce(T) -> BackendResponse,
    {
        match result {
            Ok(value) => {
                tracing::debug!(operation = operation, "backend operation successful");
                on_success(value)
            }
            Err(e) => {
                tracing::debug!(operation = operation, error = %e, "backend operation failed");
                BackendResponse::Error {
                    message: format!("{operation}: {e}"),
                }
            }
        }
    }

    /// Processes one request.
    pub async fn handle_request(&self, request: BackendRequest) -> BackendResponse {
        let operation = request.operation();
        tracing::debug!(operation = operation, "handling backend request");

        match request {
            BackendRequest::LoadLists => {
                Self::handle_result(operation, self.data.load_lists().await, |lists| {
                    BackendResponse::ListsLoaded { lists }
                })
            }
            BackendRequest::LoadTasks => {
                Self::handle_result(operation, self.data.load_tasks().await, |tasks| {
                    BackendResponse::TasksLoaded { tasks }
                })
            }
            BackendRequest::ApplyBatch { batch } => {
                Self::handle_result(operation, self.data.apply_batch(batch).await, |receipt| {
                    BackendResponse::BatchApplied { receipt }
                })
            }
            BackendRequest::Replay { op } => {
                let op_id = op.op_id.clone();
                Self::handle_result(operation, self.data.replay(op).await, |outcome| {
                    BackendResponse::Replayed { op_id, outcome }
                })
            }
            BackendRequest::Search { request } => {
                Self::handle_result(operation, self.data.search(request).await, |hits| {
                    BackendResponse::SearchResults { hits }
                })
            }
        }
    }

    /// Decodes a JSON request, handles it and encodes the response.
    ///
    /// Undecodable payloads produce an encoded [`BackendResponse::Error`].
    pub async fn handle_json(&self, payload: &str) -> String {
        let response = match serde_json::from_str::<BackendRequest>(payload) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::debug!(error = %e, "failed to deserialize backend request");
                BackendResponse::Error {
                    message: format!("invalid request: {e}"),
                }
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize backend response");
            format!(r#"{{"type":"error","message":"unserializable response: {e}"}}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::domain::{Task, TodoList};
    use chrono::Utc;
    use futures::executor::block_on;

    fn bridge() -> (Rc<InMemoryBackend>, BackendBridge<InMemoryBackend>) {
        let now = Utc::now();
        let backend = Rc::new(InMemoryBackend::with_data(
            vec![TodoList::new("l1", "Work", now)],
            vec![Task::new("t1", "l1", "Write report", now)],
        ));
        (Rc::clone(&backend), BackendBridge::new(backend))
    }

    #[test]
    fn search_round_trips_through_json() {
        let (_, bridge) = bridge();
        let raw = block_on(bridge.handle_json(r#"{"type":"search","request":{"query":"report"}}"#));
        let response: BackendResponse = serde_json::from_str(&raw).unwrap();
        match response {
            BackendResponse::SearchResults { hits } => assert_eq!(hits.len(), 1),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn failures_become_error_responses() {
        let (backend, bridge) = bridge();
        backend.set_reachable(false);
        let response = block_on(bridge.handle_request(BackendRequest::LoadLists));
        assert_eq!(
            response,
            BackendResponse::Error { message: "load lists: Backend error: data layer unreachable".to_string() }
        );
    }

    #[test]
    fn garbage_payload_is_reported() {
        let (_, bridge) = bridge();
        let raw = block_on(bridge.handle_json("{"));
        assert!(raw.contains(r#""type":"error""#));
    }
}
