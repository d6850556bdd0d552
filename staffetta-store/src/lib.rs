//! Durable storage for queued notifications
//!
//! This crate provides:
//! - The [`QueueItem`] record and its identifier type
//! - The [`QueueStore`] trait the processor drives deliveries through
//! - A file-backed store for production and a memory store for testing

pub mod backends;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use backends::{FileQueueStore, MemoryQueueStore};
pub use config::{MemoryConfig, StoreConfig};
pub use error::{Result, SerializationError, StoreError, ValidationError};
pub use store::QueueStore;
pub use types::{Mailbox, QueueItem, QueueItemId, StatusCounts};
