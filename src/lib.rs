//! todo-core: the client-side core of a todo-list application.
//!
//! The crate holds everything a todo frontend needs beyond drawing pixels:
//! - Multi-select with range selection and bulk actions
//! - Client-side and server-side search with ranking, highlighting and debounce
//! - A context-stacked keyboard shortcut registry
//! - An offline queue with idempotent replay and conflict handling
//! - Summary statistics and JSON import/export

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Shell binary (main.rs) / embedding frontend        │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling                                   │
//! │  - Action execution (Runtime)                       │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ selection/    │   │ search/       │   │ sync/         │
//! │ shortcuts/    │   │ - Ranking     │   │ - Queue       │
//! │ - Reducer     │   │ - Debounce    │   │ - Replay      │
//! │ - Key stack   │   │ - Recents     │   │ - Conflicts   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  backend/ (DataLayer, bridge)   storage/ (LocalStore)│
//! │  reports/ (summary, export)     domain/ (types, errs)│
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - JSON log lines to a rotating file                │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! ```toml
//! data_dir = "~/.local/share/todo-core"
//! trace_level = "debug"
//!
//! [search]
//! mode = "server"
//! min_query_len = 2
//! debounce_ms = 300
//! fuzzy = true
//!
//! [queue]
//! max_attempts = 5
//! base_backoff_ms = 500
//! conflict_policy = "manual"
//! ```
//!
//! # Examples
//!
//! ```
//! use todo_core::{initialize, handle_event, Clock, Config, Event};
//! use todo_core::domain::{Task, TodoList};
//! use todo_core::storage::MemoryStore;
//!
//! let mut state = initialize(&Config::default(), &MemoryStore::new())?;
//! let now = chrono::Utc::now();
//! handle_event(&mut state, &Event::DataLoaded {
//!     lists: vec![TodoList::new("l1", "Inbox", now)],
//!     tasks: vec![Task::new("t1", "l1", "Buy milk", now)],
//! }, Clock::now())?;
//!
//! handle_event(&mut state, &Event::Key("ctrl+a".parse()?), Clock::now())?;
//! assert_eq!(state.selection.selected_count(), 1);
//! # Ok::<(), todo_core::TodoError>(())
//! ```

pub mod app;
pub mod backend;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod reports;
pub mod search;
pub mod selection;
pub mod shortcuts;
pub mod storage;
pub mod sync;

pub use app::{handle_event, Action, AppState, Clock, Event, InputMode, Runtime, SearchFocus, ViewMode};
pub use domain::{Result, TodoError};

use app::default_registry;
use search::{RecentSearches, SearchMode, SearchOptions, SearchSession, DEFAULT_RECENT_CAPACITY};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::LocalStore;
use sync::{ConflictPolicy, OfflineQueue, QueueConfig};

/// Search tunables.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Where matching runs. Default: client.
    pub mode: SearchMode,
    /// Trimmed queries shorter than this return nothing. Default: 2
    pub min_query_len: usize,
    /// Maximum results after ranking. Default: 50
    pub limit: usize,
    /// Quiet period before a query is sent or recorded. Default: 300
    pub debounce_ms: u64,
    /// Entries kept in the recent-searches list. Default: 10
    pub recent_capacity: usize,
    /// Edit-distance fallback for long queries. Default: off
    pub fuzzy: bool,
    pub max_edit_distance: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            mode: SearchMode::default(),
            min_query_len: options.min_query_len,
            limit: options.limit,
            debounce_ms: 300,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            fuzzy: options.fuzzy,
            max_edit_distance: options.max_edit_distance,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn options(&self) -> SearchOptions {
        SearchOptions {
            limit: self.limit,
            min_query_len: self.min_query_len,
            fuzzy: self.fuzzy,
            max_edit_distance: self.max_edit_distance,
        }
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Runtime configuration.
///
/// # Example
///
/// ```
/// use todo_core::Config;
/// use todo_core::search::SearchMode;
///
/// let config = Config::from_toml_str("[search]\nmode = \"server\"\n")?;
/// assert_eq!(config.search.mode, SearchMode::Server);
/// assert_eq!(config.search.min_query_len, 2);
/// # Ok::<(), todo_core::TodoError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for the local store and the log file.
    ///
    /// `~` is expanded. Default: see [`infrastructure::get_data_dir`].
    pub data_dir: Option<PathBuf>,

    pub search: SearchConfig,

    pub queue: QueueConfig,

    /// Tracing filter directive.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any
    /// `EnvFilter` directive. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Config {
    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Io`] if the file cannot be read and
    /// [`TodoError::Config`] if it is not valid TOML for this shape.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parses TOML; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Config`] on malformed input.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TodoError::Config(e.to_string()))
    }

    /// Parses a flat string map such as a host application's settings.
    ///
    /// Every key is optional; a value that fails to parse is logged and the
    /// default is used.
    ///
    /// # Keys
    ///
    /// `data_dir`, `trace_level`, `search_mode` (`client`/`server`),
    /// `min_query_len`, `search_limit`, `debounce_ms`, `recent_capacity`,
    /// `fuzzy`, `max_edit_distance`, `max_attempts`, `base_backoff_ms`,
    /// `conflict_policy` (`server_wins`/`client_wins`/`manual`).
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use todo_core::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("debounce_ms".to_string(), "150".to_string());
    /// map.insert("max_attempts".to_string(), "many".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.search.debounce_ms, 150);
    /// assert_eq!(config.queue.max_attempts, 5);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let search_mode = map.get("search_mode").and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
            "client" => Some(SearchMode::Client),
            "server" => Some(SearchMode::Server),
            other => {
                tracing::warn!(value = other, "unknown search_mode, using default");
                None
            }
        });

        Self {
            data_dir: map.get("data_dir").filter(|s| !s.trim().is_empty()).map(PathBuf::from),
            trace_level: map.get("trace_level").cloned(),
            search: SearchConfig {
                mode: search_mode.unwrap_or(defaults.search.mode),
                min_query_len: parsed(map, "min_query_len").unwrap_or(defaults.search.min_query_len),
                limit: parsed(map, "search_limit").unwrap_or(defaults.search.limit),
                debounce_ms: parsed(map, "debounce_ms").unwrap_or(defaults.search.debounce_ms),
                recent_capacity: parsed(map, "recent_capacity").unwrap_or(defaults.search.recent_capacity),
                fuzzy: parsed(map, "fuzzy").unwrap_or(defaults.search.fuzzy),
                max_edit_distance: parsed(map, "max_edit_distance").unwrap_or(defaults.search.max_edit_distance),
            },
            queue: QueueConfig {
                max_attempts: parsed(map, "max_attempts").unwrap_or(defaults.queue.max_attempts),
                base_backoff_ms: parsed(map, "base_backoff_ms").unwrap_or(defaults.queue.base_backoff_ms),
                conflict_policy: map
                    .get("conflict_policy")
                    .and_then(|s| ConflictPolicy::parse(s))
                    .unwrap_or(defaults.queue.conflict_policy),
            },
        }
    }

    /// The resolved data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        infrastructure::resolve_data_dir(self.data_dir.as_deref())
    }

    /// Path of the JSON local store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(infrastructure::STORE_FILE)
    }
}

fn parsed<T: std::str::FromStr>(map: &BTreeMap<String, String>, key: &str) -> Option<T> {
    let raw = map.get(key)?;
    let value = raw.trim().parse().ok();
    if value.is_none() {
        tracing::warn!(key = key, value = %raw, "invalid config value, using default");
    }
    value
}

/// Builds the application state.
///
/// Recent searches and the offline queue are restored from `store`. A
/// corrupt recent-searches entry is discarded with a warning; the data
/// itself arrives later through [`Event::DataLoaded`].
///
/// # Errors
///
/// Returns [`TodoError::Queue`] when the persisted offline queue cannot be
/// decoded, and [`TodoError::Shortcut`] if the default key bindings fail to
/// install.
///
/// # Example
///
/// ```
/// use todo_core::{initialize, Config, InputMode};
/// use todo_core::storage::MemoryStore;
///
/// let state = initialize(&Config::default(), &MemoryStore::new())?;
/// assert_eq!(state.input_mode, InputMode::Normal);
/// assert!(state.queue.is_empty());
/// # Ok::<(), todo_core::TodoError>(())
/// ```
pub fn initialize(config: &Config, store: &dyn LocalStore) -> Result<AppState> {
    let _span = tracing::debug_span!("initialize", search_mode = ?config.search.mode).entered();

    let recent = RecentSearches::load(store, config.search.recent_capacity);
    let queue = OfflineQueue::load(store, config.queue)?;
    tracing::debug!(recent = recent.len(), queued = queue.len(), "restored local state");

    let search = SearchSession::new(
        config.search.mode,
        config.search.debounce(),
        config.search.options(),
        recent,
    );
    let mut state = AppState::new(search, queue, default_registry()?);
    state.sync_contexts();
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{save_json, MemoryStore, OFFLINE_QUEUE_KEY};

    #[test]
    fn toml_defaults_fill_missing_sections() {
        let config = Config::from_toml_str("trace_level = \"debug\"\n[queue]\nconflict_policy = \"client_wins\"\n").unwrap();
        assert_eq!(config.trace_level.as_deref(), Some("debug"));
        assert_eq!(config.queue.conflict_policy, ConflictPolicy::ClientWins);
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::from_toml_str("search = 3").unwrap_err();
        assert!(matches!(err, TodoError::Config(_)));
    }

    #[test]
    fn map_parses_typed_values() {
        let map: BTreeMap<String, String> = [
            ("search_mode", "server"),
            ("fuzzy", "true"),
            ("conflict_policy", "server-wins"),
            ("data_dir", "/tmp/todo"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::from_map(&map);
        assert_eq!(config.search.mode, SearchMode::Server);
        assert!(config.search.fuzzy);
        assert_eq!(config.queue.conflict_policy, ConflictPolicy::ServerWins);
        assert_eq!(config.store_path(), PathBuf::from("/tmp/todo/local.json"));
    }

    #[test]
    fn corrupt_queue_fails_initialization() {
        let mut store = MemoryStore::new();
        save_json(&mut store, OFFLINE_QUEUE_KEY, &"not a queue").unwrap();
        let err = initialize(&Config::default(), &store).unwrap_err();
        assert!(matches!(err, TodoError::Queue(_)));
    }
}
