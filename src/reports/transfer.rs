//! JSON export and import of a whole workspace.
//!
//! # Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "exported_at": "2025-05-01T12:00:00Z",
//!   "lists": [ { "id": "l1", "name": "Work", ... } ],
//!   "tasks": [ { "id": "t1", "list_id": "l1", "title": "Write report", ... } ]
//! }
//! ```

use crate::domain::error::{Result, TodoError};
use crate::domain::{BatchMutation, Mutation, Task, TodoList};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Envelope version written by [`export_json`] and accepted by [`import_json`].
pub const EXPORT_VERSION: u32 = 1;

/// Versioned export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub lists: Vec<TodoList>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ExportDocument {
    /// Upsert mutations recreating every list, then every task.
    #[must_use]
    pub fn into_batch(self) -> BatchMutation {
        let mutations = self
            .lists
            .into_iter()
            .map(|list| Mutation::UpsertList { list })
            .chain(self.tasks.into_iter().map(|task| Mutation::UpsertTask { task }))
            .collect();
        BatchMutation::new(mutations)
    }
}

/// Serializes lists and tasks into a pretty-printed export document.
///
/// # Errors
///
/// Returns [`TodoError::Serialization`] if encoding fails.
pub fn export_json(lists: &[TodoList], tasks: &[Task], now: DateTime<Utc>) -> Result<String> {
    let document = ExportDocument {
        version: EXPORT_VERSION,
        exported_at: now,
        lists: lists.to_vec(),
        tasks: tasks.to_vec(),
    };
    tracing::debug!(lists = lists.len(), tasks = tasks.len(), "exporting workspace");
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parses and validates an export document.
///
/// # Errors
///
/// Returns [`TodoError::Import`] when:
/// - The text is not a valid export document
/// - The version is not [`EXPORT_VERSION`]
/// - Two lists or two tasks share an id
/// - A task references a list that is not in the document
pub fn import_json(raw: &str) -> Result<ExportDocument> {
    let document: ExportDocument =
        serde_json::from_str(raw).map_err(|e| TodoError::Import(format!("malformed export: {e}")))?;

    if document.version != EXPORT_VERSION {
        return Err(TodoError::Import(format!(
            "unsupported export version {} (expected {EXPORT_VERSION})",
            document.version
        )));
    }

    let mut list_ids = HashSet::new();
    for list in &document.lists {
        if !list_ids.insert(&list.id) {
            return Err(TodoError::Import(format!("duplicate list id {}", list.id)));
        }
    }

    let mut task_ids = HashSet::new();
    for task in &document.tasks {
        if !task_ids.insert(&task.id) {
            return Err(TodoError::Import(format!("duplicate task id {}", task.id)));
        }
        if !list_ids.contains(&task.list_id) {
            return Err(TodoError::Import(format!(
                "task {} references unknown list {}",
                task.id, task.list_id
            )));
        }
    }

    tracing::debug!(lists = document.lists.len(), tasks = document.tasks.len(), "import validated");
    Ok(document)
}
