//! Data layer access.
//!
//! - `data_layer`: [`DataLayer`] trait the core awaits
//! - `memory`: [`InMemoryBackend`] reference implementation
//! - `messages`: Serialized request/response protocol
//! - `bridge`: [`BackendBridge`] serving that protocol from a data layer

pub mod bridge;
pub mod data_layer;
pub mod memory;
pub mod messages;

pub use bridge::BackendBridge;
pub use data_layer::{BatchReceipt, DataLayer};
pub use memory::InMemoryBackend;
pub use messages::{BackendRequest, BackendResponse};
