//! Error types for the todo core.
//!
//! This module defines the centralized error type [`TodoError`] and a type alias
//! [`Result`] used throughout the crate. Errors are implemented with `thiserror`.
//!
//! Selection operations are total and never produce errors. Search failures are
//! captured into the search session's error state instead of being returned, so
//! most variants here come from persistence, configuration and the backend bridge.

use thiserror::Error;

/// The main error type for todo core operations.
///
/// # Examples
///
/// ```
/// use todo_core::TodoError;
///
/// fn validate() -> Result<(), TodoError> {
///     Err(TodoError::Config("limit must be positive".to_string()))
/// }
///
/// assert!(validate().is_err());
/// ```
#[derive(Debug, Error)]
pub enum TodoError {
    /// Local persistence failed (read, write or missing record).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external data layer rejected or failed a request.
    ///
    /// The string carries the backend's message (network, timeout, authorization).
    #[error("Backend error: {0}")]
    Backend(String),

    /// The offline queue payload is corrupt or an operation is unknown.
    #[error("Offline queue error: {0}")]
    Queue(String),

    /// An export document failed validation during import.
    #[error("Import error: {0}")]
    Import(String),

    /// A shortcut could not be parsed or registered.
    #[error("Shortcut error: {0}")]
    Shortcut(String),
}

/// A specialized `Result` type for todo core operations.
pub type Result<T> = std::result::Result<T, TodoError>;
