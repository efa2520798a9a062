//! Structured logging to a rotating file.
//!
//! # Features
//!
//! - **JSON lines**: one event per line with the current span's fields
//! - **Automatic rotation**: files rotate at 10MB with 3-backup retention
//! - **Location**: `<data dir>/todo-core.log`
//!
//! # Configuration
//!
//! Level is controlled by `RUST_LOG` (highest priority), then the
//! `trace_level` config option, then `"info"`.
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Rotating file writer with size-based rotation

pub mod file_writer;
mod init;

pub use file_writer::RotatingFile;
pub use init::init_tracing;
