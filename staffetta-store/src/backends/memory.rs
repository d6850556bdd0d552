use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use staffetta_common::DeliveryStatus;

use crate::{
    StoreError,
    store::QueueStore,
    types::{QueueItem, QueueItemId, StatusCounts},
};

/// In-memory queue store implementation
///
/// This implementation stores items in a `HashMap` protected by an `RwLock`.
/// It's primarily intended for testing, but can also be used for transient
/// deployments where losing the queue on restart is acceptable.
///
/// # Capacity Management
/// The store can be configured with a maximum capacity to prevent unbounded
/// memory growth. When capacity is reached, inserts fail with an error.
///
/// # Concurrency
/// Uses an `RwLock` for interior mutability; every mutation happens under
/// the write lock, so per-row atomicity holds trivially.
#[derive(Debug, Clone)]
pub struct MemoryQueueStore {
    items: Arc<RwLock<HashMap<QueueItemId, QueueItem>>>,
    /// Maximum number of items to store (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryQueueStore {
    /// Create a new empty memory store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            capacity: None,
        }
    }

    /// Create a new memory store with a capacity limit
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Get the current number of items in the store
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn insert(&self, item: &QueueItem) -> crate::Result<()> {
        let mut items = self.items.write()?;

        if items.contains_key(&item.id) {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }

        if let Some(cap) = self.capacity
            && items.len() >= cap
        {
            return Err(StoreError::Internal(format!(
                "Memory store capacity exceeded: {}/{cap} items",
                items.len()
            )));
        }

        items.insert(item.id.clone(), item.clone());

        Ok(())
    }

    async fn get(&self, id: &QueueItemId) -> crate::Result<Option<QueueItem>> {
        Ok(self.items.read()?.get(id).cloned())
    }

    async fn most_recent_for_lead(&self, lead_id: &str) -> crate::Result<Option<QueueItem>> {
        Ok(self
            .items
            .read()?
            .values()
            .filter(|item| item.lead_id == lead_id)
            .max_by_key(|item| (item.created_at, item.id.clone()))
            .cloned())
    }

    async fn exists_for_lead(&self, lead_id: &str) -> crate::Result<bool> {
        Ok(self
            .items
            .read()?
            .values()
            .any(|item| item.lead_id == lead_id))
    }

    async fn select_due_pending(&self, now: u64, limit: usize) -> crate::Result<Vec<QueueItem>> {
        let mut due: Vec<_> = self
            .items
            .read()?
            .values()
            .filter(|item| item.is_due(now))
            .cloned()
            .collect();

        // Oldest first for fairness; id is time-ordered, so ties within the
        // same second keep creation order
        due.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));
        due.truncate(limit);

        Ok(due)
    }

    async fn mark_sent(&self, id: &QueueItemId, sent_at: u64) -> crate::Result<()> {
        let mut items = self.items.write()?;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if item.status == DeliveryStatus::Sent {
            return Ok(());
        }

        item.status = DeliveryStatus::Sent;
        item.sent_at = Some(sent_at);

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: &QueueItemId,
        error: &str,
        retry_count: u32,
        next_retry_at: Option<u64>,
    ) -> crate::Result<()> {
        let mut items = self.items.write()?;
        let item = items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        item.last_error = Some(error.to_string());
        item.retry_count = retry_count;
        item.next_retry_at = next_retry_at;
        item.status = if next_retry_at.is_some() {
            DeliveryStatus::Pending
        } else {
            DeliveryStatus::Failed
        };

        Ok(())
    }

    async fn delete(&self, id: &QueueItemId) -> crate::Result<()> {
        self.items
            .write()?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(())
    }

    async fn count_by_status(&self) -> crate::Result<StatusCounts> {
        Ok(StatusCounts::tally(
            self.items.read()?.values().map(|item| item.status),
        ))
    }
}
