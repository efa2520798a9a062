//! Local persistence for small client-side documents.
//!
//! # Modules
//!
//! - `local`: [`LocalStore`] trait, well-known keys and JSON helpers
//! - `json`: File-backed store with atomic writes
//! - `memory`: In-memory store

pub mod json;
pub mod local;
pub mod memory;

pub use json::JsonFileStore;
pub use local::{load_json, save_json, LocalStore, OFFLINE_QUEUE_KEY, RECENT_SEARCHES_KEY};
pub use memory::MemoryStore;
