//! Todo list and task models.
//!
//! Lists and tasks are the two entity collections owned by the data layer. Both
//! are keyed by an opaque [`ItemId`] and carry creation/update timestamps used by
//! search tie-breaking and optimistic conflict detection in the offline queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a list or task.
///
/// The backend chooses the format; the core only compares ids for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Anything that can be looked up in a selection by id.
pub trait Identified {
    /// Returns the item's identifier.
    fn id(&self) -> &ItemId;
}

impl Identified for ItemId {
    fn id(&self) -> &ItemId {
        self
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parses `low`, `medium` or `high` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Which entity collection an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    List,
}

/// A named todo list owning zero or more tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the data layer on every write; used as the optimistic version.
    pub updated_at: DateTime<Utc>,
}

impl TodoList {
    /// Creates a list with both timestamps set to `created_at`.
    ///
    /// # Examples
    ///
    /// ```
    /// use todo_core::domain::TodoList;
    ///
    /// let list = TodoList::new("l1", "Groceries", chrono::Utc::now());
    /// assert_eq!(list.name, "Groceries");
    /// assert!(list.description.is_none());
    /// ```
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Identified for TodoList {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

/// A single task inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: ItemId,
    pub list_id: ItemId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates an incomplete, medium-priority task.
    ///
    /// # Examples
    ///
    /// ```
    /// use todo_core::domain::{Priority, Task};
    ///
    /// let task = Task::new("t1", "l1", "Buy milk", chrono::Utc::now());
    /// assert!(!task.completed);
    /// assert_eq!(task.priority, Priority::Medium);
    /// ```
    pub fn new(
        id: impl Into<ItemId>,
        list_id: impl Into<ItemId>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            list_id: list_id.into(),
            title: title.into(),
            description: None,
            completed: false,
            priority: Priority::default(),
            due_date: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// True when the task is open and its due date lies before `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

impl Identified for Task {
    fn id(&self) -> &ItemId {
        &self.id
    }
}
