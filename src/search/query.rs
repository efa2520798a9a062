//! Search request shape: filters, options and mode.
//!
//! The same [`SearchRequest`] is evaluated locally in client mode and serialized
//! to the backend in server mode, so every field here derives serde.

use crate::domain::{Priority, Task, TodoList};
use serde::{Deserialize, Serialize};

/// Default minimum trimmed query length, in characters.
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// Default maximum number of results.
pub const DEFAULT_LIMIT: usize = 50;

/// Which entity collection to search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Tasks,
    Lists,
}

/// Priority facet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    const fn wanted(self) -> Option<Priority> {
        match self {
            Self::All => None,
            Self::Low => Some(Priority::Low),
            Self::Medium => Some(Priority::Medium),
            Self::High => Some(Priority::High),
        }
    }
}

/// Completion facet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletedFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

/// Independent facets ANDed with each other and with the text match.
///
/// Lists carry neither a priority nor a completion flag, so any non-`All`
/// priority or completion facet excludes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(rename = "type", default)]
    pub item_type: TypeFilter,
    #[serde(default)]
    pub priority: PriorityFilter,
    #[serde(default)]
    pub completed: CompletedFilter,
}

impl SearchFilters {
    #[must_use]
    pub fn tasks_only() -> Self {
        Self {
            item_type: TypeFilter::Tasks,
            ..Self::default()
        }
    }

    /// Whether a task passes every facet.
    #[must_use]
    pub fn admits_task(&self, task: &Task) -> bool {
        if self.item_type == TypeFilter::Lists {
            return false;
        }
        if let Some(priority) = self.priority.wanted() {
            if task.priority != priority {
                return false;
            }
        }
        match self.completed {
            CompletedFilter::All => true,
            CompletedFilter::Completed => task.completed,
            CompletedFilter::Incomplete => !task.completed,
        }
    }

    /// Whether a list passes every facet.
    #[must_use]
    pub fn admits_list(&self, _list: &TodoList) -> bool {
        self.item_type != TypeFilter::Tasks
            && self.priority == PriorityFilter::All
            && self.completed == CompletedFilter::All
    }
}

/// Where matching happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Matching is delegated to the data layer.
    Server,
    /// Matching runs over an in-memory collection.
    #[default]
    Client,
}

/// Tunables for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Maximum number of results after ranking.
    pub limit: usize,
    /// Trimmed queries shorter than this (in characters) return nothing.
    pub min_query_len: usize,
    /// Fall back to edit-distance matching when exact containment fails.
    pub fuzzy: bool,
    /// Largest edit distance accepted by the fuzzy fallback.
    pub max_edit_distance: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            fuzzy: false,
            max_edit_distance: 1,
        }
    }
}

/// Complete description of one search, in either mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, filters: SearchFilters, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            filters,
            options,
        }
    }

    /// The query with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }

    /// False when the trimmed query is below the minimum length.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        is_searchable(&self.query, self.options.min_query_len)
    }
}

/// True when `query`, once trimmed, has at least `min_len` characters.
///
/// An empty query is never searchable, even with `min_len == 0`.
#[must_use]
pub fn is_searchable(query: &str, min_len: usize) -> bool {
    let count = query.trim().chars().count();
    count > 0 && count >= min_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn lists_excluded_by_task_facets() {
        let list = TodoList::new("l1", "Groceries", Utc::now());
        assert!(SearchFilters::default().admits_list(&list));
        assert!(!SearchFilters::tasks_only().admits_list(&list));

        let completed_only = SearchFilters {
            completed: CompletedFilter::Completed,
            ..SearchFilters::default()
        };
        assert!(!completed_only.admits_list(&list));
    }

    #[test]
    fn task_facets_are_anded() {
        let task = Task::new("t1", "l1", "Ship", Utc::now())
            .with_priority(Priority::High)
            .with_completed(true);

        let filters = SearchFilters {
            item_type: TypeFilter::Tasks,
            priority: PriorityFilter::High,
            completed: CompletedFilter::Completed,
        };
        assert!(filters.admits_task(&task));

        let wrong_priority = SearchFilters { priority: PriorityFilter::Low, ..filters };
        assert!(!wrong_priority.admits_task(&task));

        let lists_only = SearchFilters { item_type: TypeFilter::Lists, ..SearchFilters::default() };
        assert!(!lists_only.admits_task(&task));
    }

    #[test]
    fn searchable_requires_minimum_trimmed_length() {
        assert!(!is_searchable("", 0));
        assert!(!is_searchable("   ", 2));
        assert!(!is_searchable(" a ", 2));
        assert!(is_searchable(" ab ", 2));
    }

    #[test]
    fn filters_use_type_key_on_the_wire() {
        let json = serde_json::to_value(SearchFilters::tasks_only()).unwrap();
        assert_eq!(json["type"], "tasks");
        assert_eq!(json["completed"], "all");
    }
}
