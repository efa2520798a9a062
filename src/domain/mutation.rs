//! Write operations issued against the external data layer.
//!
//! A [`Mutation`] describes one change to one entity. Mutations travel in a
//! [`BatchMutation`] (bulk toolbar, import) or individually through the offline
//! queue, where each gets an [`OpId`] so that replaying it twice is harmless.

use crate::domain::{ItemId, Priority, Task, TodoList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter mixed into generated operation ids.
static OP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Idempotency key for a single mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpId(String);

impl OpId {
    /// Generates a fresh id from the current time and a process counter.
    #[must_use]
    pub fn generate() -> Self {
        let seq = OP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!("op-{millis:x}-{seq}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single change to a task or list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Marks a task completed or reopens it.
    Complete { id: ItemId, completed: bool },
    /// Deletes a task or list.
    Delete { id: ItemId },
    /// Moves a task into another list.
    Move { id: ItemId, to_list: ItemId },
    /// Changes a task's priority.
    SetPriority { id: ItemId, priority: Priority },
    /// Creates or replaces a list (import).
    UpsertList { list: TodoList },
    /// Creates or replaces a task (import).
    UpsertTask { task: Task },
}

impl Mutation {
    /// Id of the entity this mutation targets.
    #[must_use]
    pub fn target(&self) -> &ItemId {
        match self {
            Self::Complete { id, .. }
            | Self::Delete { id }
            | Self::Move { id, .. }
            | Self::SetPriority { id, .. } => id,
            Self::UpsertList { list } => &list.id,
            Self::UpsertTask { task } => &task.id,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Delete { .. } => "delete",
            Self::Move { .. } => "move",
            Self::SetPriority { .. } => "set_priority",
            Self::UpsertList { .. } => "upsert_list",
            Self::UpsertTask { .. } => "upsert_task",
        }
    }
}

/// Mutations applied together as one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMutation {
    pub batch_id: OpId,
    pub mutations: Vec<Mutation>,
}

impl BatchMutation {
    /// Wraps mutations under a freshly generated batch id.
    #[must_use]
    pub fn new(mutations: Vec<Mutation>) -> Self {
        Self {
            batch_id: OpId::generate(),
            mutations,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_op_ids_are_unique() {
        let a = OpId::generate();
        let b = OpId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn mutation_serializes_with_op_tag() {
        let m = Mutation::Complete { id: ItemId::new("t1"), completed: true };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["op"], "complete");
        assert_eq!(json["id"], "t1");
        assert_eq!(m.target().as_str(), "t1");
    }
}
