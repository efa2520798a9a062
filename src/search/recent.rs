//! Most-recently-used search queries.

use crate::domain::error::Result;
use crate::storage::{load_json, save_json, LocalStore, RECENT_SEARCHES_KEY};

/// Default number of remembered queries.
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Capped, deduplicated list of past queries, most recent first.
///
/// # Examples
///
/// ```
/// use todo_core::search::RecentSearches;
///
/// let mut recent = RecentSearches::new(3);
/// recent.push("milk");
/// recent.push("report");
/// recent.push("milk");
/// assert_eq!(recent.entries(), ["milk", "report"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSearches {
    entries: Vec<String>,
    capacity: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

impl RecentSearches {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Moves `query` (trimmed) to the front, evicting the oldest entry past
    /// capacity. Returns whether the list changed.
    pub fn push(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() || self.capacity == 0 {
            return false;
        }
        if self.entries.first().is_some_and(|front| front == query) {
            return false;
        }

        self.entries.retain(|existing| existing != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.capacity);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads the persisted list, applying this process's capacity.
    ///
    /// A missing or unreadable entry yields an empty list; recent searches are
    /// a convenience and never block startup.
    pub fn load(store: &dyn LocalStore, capacity: usize) -> Self {
        let mut recent = Self::new(capacity);
        match load_json::<Vec<String>>(store, RECENT_SEARCHES_KEY) {
            Ok(Some(saved)) => {
                for query in saved.iter().rev() {
                    recent.push(query);
                }
                tracing::debug!(count = recent.len(), "recent searches loaded");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "discarding unreadable recent searches"),
        }
        recent
    }

    /// Persists the list under [`RECENT_SEARCHES_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn save(&self, store: &mut dyn LocalStore) -> Result<()> {
        save_json(store, RECENT_SEARCHES_KEY, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn capped_and_deduplicated() {
        let mut recent = RecentSearches::default();
        for i in 0..15 {
            recent.push(&format!("query {i}"));
        }
        recent.push("query 10");

        assert_eq!(recent.len(), DEFAULT_RECENT_CAPACITY);
        assert_eq!(recent.entries()[0], "query 10");
        assert_eq!(recent.entries().iter().filter(|q| *q == "query 10").count(), 1);
    }

    #[test]
    fn blank_queries_are_ignored() {
        let mut recent = RecentSearches::default();
        assert!(!recent.push("   "));
        assert!(recent.is_empty());
    }

    #[test]
    fn survives_store_round_trip() {
        let mut store = MemoryStore::new();
        let mut recent = RecentSearches::new(5);
        recent.push("a");
        recent.push("b");
        recent.save(&mut store).unwrap();

        let loaded = RecentSearches::load(&store, 5);
        assert_eq!(loaded, recent);
    }

    #[test]
    fn corrupt_entry_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(RECENT_SEARCHES_KEY, "{oops".to_string()).unwrap();
        assert!(RecentSearches::load(&store, 5).is_empty());
    }
}
