use std::sync::Arc;

use serde::Deserialize;

use crate::{FileQueueStore, MemoryQueueStore, store::QueueStore};

/// Configuration for the queue store backend
///
/// This enum allows runtime selection of the backing implementation through
/// configuration files.
///
/// # Examples
///
/// File-backed store in TOML config:
/// ```toml
/// [store]
/// type = "File"
/// path = "/var/lib/staffetta/queue"
/// ```
///
/// Memory-backed store for testing:
/// ```toml
/// [store]
/// type = "Memory"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// File-based store (production)
    File(FileQueueStore),
    /// Memory-based store (testing/development)
    ///
    /// Can optionally specify a capacity limit to prevent unbounded growth
    Memory(MemoryConfig),
}

/// Configuration for the memory-backed store
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemoryConfig {
    /// Maximum number of items to store (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::File(FileQueueStore::default())
    }
}

impl StoreConfig {
    /// Get the filesystem path for file-backed stores, if applicable
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(store) => Some(store.path()),
            Self::Memory(_) => None,
        }
    }

    /// Convert the configuration into a concrete store
    ///
    /// File-backed stores are initialized here (directory creation, stale
    /// file sweep), so this is the place startup fails fast on a bad path.
    ///
    /// # Errors
    /// Returns an error if file store initialization fails.
    pub fn into_store(self) -> crate::Result<Arc<dyn QueueStore>> {
        match self {
            Self::File(store) => {
                store.init()?;
                Ok(Arc::new(store))
            }
            Self::Memory(config) => Ok(config.capacity.map_or_else(
                || Arc::new(MemoryQueueStore::new()) as Arc<dyn QueueStore>,
                |capacity| Arc::new(MemoryQueueStore::with_capacity(capacity)),
            )),
        }
    }
}
