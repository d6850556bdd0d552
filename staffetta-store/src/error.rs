//! Error types for the staffetta-store crate.

use std::io;

use thiserror::Error;

use crate::QueueItemId;

/// Top-level store error type.
///
/// All store operations return this error type, which categorizes failures
/// into I/O, serialization, validation, and logical errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O operation failed (file read/write/delete).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Queue item not found in the store.
    #[error("Queue item not found: {0}")]
    NotFound(QueueItemId),

    /// A row with the same id already exists.
    #[error("Queue item already exists: {0}")]
    AlreadyExists(QueueItemId),

    /// Store directory validation failed.
    #[error("Store validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serialization and deserialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Bincode serialization failed.
    #[error("Bincode encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Bincode deserialization failed.
    #[error("Bincode decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Store directory validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Store path is not a directory.
    #[error("Store path is not a directory: {0}")]
    NotDirectory(String),

    /// Store path must be absolute.
    #[error("Store path must be absolute: {0}")]
    RelativePath(String),

    /// Store path contains directory traversal components.
    #[error("Store path cannot contain '..' components: {0}")]
    ParentComponent(String),

    /// Store path points into a sensitive system directory.
    #[error("Store path cannot be in system directory {prefix}: {path}")]
    SystemDirectory { prefix: String, path: String },
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
