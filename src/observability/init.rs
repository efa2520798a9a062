//! Tracing initialization and subscriber setup.
//!
//! Wires `tracing` macros to JSON log lines in a rotating file:
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer (JSON) → RotatingFile → todo-core.log
//! ```

use super::file_writer::RotatingFile;
use crate::infrastructure::LOG_FILE;
use crate::Config;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// # Trace Level Resolution
///
/// 1. `RUST_LOG` if set and valid
/// 2. `config.trace_level`
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// - Creates the data directory if it doesn't exist
/// - Silently does nothing if the directory cannot be created (logging is optional)
/// - Idempotent: only the first call installs a subscriber
///
/// Returns the log file path when logging was enabled by this call.
///
/// # Example
///
/// ```
/// use todo_core::observability::init_tracing;
/// use todo_core::Config;
///
/// let dir = tempfile::tempdir()?;
/// let config = Config {
///     data_dir: Some(dir.path().to_path_buf()),
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn init_tracing(config: &Config) -> Option<std::path::PathBuf> {
    let level = config.trace_level.clone().unwrap_or_else(|| "info".to_string());

    let data_dir = config.data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return None;
    }

    let log_path = data_dir.join(LOG_FILE);
    let writer = Arc::new(RotatingFile::new(log_path.clone()));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok()
        .map(|()| log_path)
}
