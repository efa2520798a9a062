//! Local key/value persistence abstraction.
//!
//! The core persists two small documents locally: recent searches and the
//! offline mutation queue. Both are stored as opaque JSON strings under a
//! fixed key, so the trait only needs string get/set.

use crate::domain::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key holding the recent-searches list.
pub const RECENT_SEARCHES_KEY: &str = "recent_searches";

/// Key holding the offline mutation queue.
pub const OFFLINE_QUEUE_KEY: &str = "offline_queue";

/// Opaque string store keyed by name.
///
/// # Implementations
///
/// - [`crate::storage::JsonFileStore`]: One JSON file with atomic writes
/// - [`crate::storage::MemoryStore`]: Process-local map, for tests and the shell
pub trait LocalStore {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Reads and deserializes the JSON document under `key`.
///
/// # Errors
///
/// Returns [`crate::domain::TodoError::Serialization`] when the stored text is
/// not valid JSON for `T`, or any error from the store itself.
pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<Option<T>> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Into::into)
}

/// Serializes `value` and stores it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the store write fails.
pub fn save_json<T: Serialize + ?Sized>(store: &mut dyn LocalStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw)
}
