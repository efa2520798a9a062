//! Derived reports and workspace transfer.
//!
//! - [`analytics`]: Completion and workload summary
//! - [`transfer`]: Versioned JSON export/import

pub mod analytics;
pub mod transfer;

pub use analytics::{summarize, ListSummary, PriorityCounts, Summary};
pub use transfer::{export_json, import_json, ExportDocument, EXPORT_VERSION};
