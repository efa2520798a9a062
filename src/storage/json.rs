//! JSON file-backed local store.
//!
//! Every key lives in one human-readable file. Writes go to a temporary file
//! first and are then renamed over the target, so a crash mid-write leaves the
//! previous contents intact.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "recent_searches": "[\"report\",\"milk\"]",
//!     "offline_queue": "{\"pending\":[]}"
//!   }
//! }
//! ```

use super::local::LocalStore;
use crate::domain::error::{Result, TodoError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// JSON file store with atomic writes.
///
/// The whole file is cached in memory. Each `set`/`remove` marks the cache
/// dirty and writes it back immediately; a failed write leaves the cache dirty
/// and is retried on the next write or on drop.
pub struct JsonFileStore {
    file_path: PathBuf,
    data: StoreFile,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens the store at `file_path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but is not a valid store document
    /// - The file cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use todo_core::storage::{JsonFileStore, LocalStore};
    /// use std::path::PathBuf;
    ///
    /// let mut store = JsonFileStore::open(PathBuf::from("/tmp/todo-core/local.json"))?;
    /// store.set("recent_searches", "[]".to_string())?;
    /// # Ok::<(), todo_core::domain::TodoError>(())
    /// ```
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening JSON store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty store");
            StoreFile::default()
        };

        tracing::debug!(entry_count = data.entries.len(), "store opened");

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<StoreFile> {
        let contents = std::fs::read_to_string(path)?;
        let data: StoreFile = serde_json::from_str(&contents)
            .map_err(|e| TodoError::Storage(format!("failed to parse {}: {e}", path.display())))?;

        if data.version != FORMAT_VERSION {
            return Err(TodoError::Storage(format!(
                "unsupported store version {} in {}",
                data.version,
                path.display()
            )));
        }

        Ok(data)
    }

    /// Writes pending changes to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| TodoError::Storage(format!("failed to serialize store: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "store saved");
        Ok(())
    }
}

impl LocalStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let _span = tracing::debug_span!("json_store_set", key = %key, bytes = value.len()).entered();

        if self.data.entries.get(key) == Some(&value) {
            return Ok(());
        }
        self.data.entries.insert(key.to_string(), value);
        self.dirty = true;
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_store_remove", key = %key).entered();

        if self.data.entries.remove(key).is_some() {
            self.dirty = true;
            self.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty store on drop");
            if let Err(e) = self.flush() {
                tracing::error!(error = %e, "failed to save on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        {
            let mut store = JsonFileStore::open(path.clone()).unwrap();
            store.set("a", "1".to_string()).unwrap();
            store.set("b", "2".to_string()).unwrap();
            store.remove("b").unwrap();
        }

        let store = JsonFileStore::open(path).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(path).err().unwrap();
        assert!(matches!(err, TodoError::Storage(_)));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        let mut store = JsonFileStore::open(path.clone()).unwrap();
        store.set("k", "v".to_string()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
