//! The storage seam the queue processor drives deliveries through

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{QueueItem, QueueItemId, StatusCounts},
};

/// Durable CRUD over [`QueueItem`] rows.
///
/// Implementations must make each write atomic per row: a concurrent reader
/// never observes a partially-updated item. No cross-row transactionality is
/// required — two processors racing on the same row resolve as
/// last-write-wins, which the retry bookkeeping tolerates (the worst case is
/// an extra duplicate send or retry cycle, never corruption).
///
/// Reads signal a missing row with `Ok(None)` / `Ok(false)`; writes that
/// require the row to exist fail with [`StoreError::NotFound`].
///
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
#[async_trait]
pub trait QueueStore: Send + Sync + std::fmt::Debug {
    /// Persist a freshly-created item.
    ///
    /// # Errors
    /// Fails with [`StoreError::AlreadyExists`] if a row with the same id is
    /// already present (practically unreachable given ULID generation), or
    /// on storage I/O failure.
    ///
    /// [`StoreError::AlreadyExists`]: crate::StoreError::AlreadyExists
    async fn insert(&self, item: &QueueItem) -> Result<()>;

    /// Fetch one item by id.
    async fn get(&self, id: &QueueItemId) -> Result<Option<QueueItem>>;

    /// Fetch the item with the greatest `created_at` among rows matching
    /// `lead_id` (ties broken by id, which is time-ordered).
    async fn most_recent_for_lead(&self, lead_id: &str) -> Result<Option<QueueItem>>;

    /// Whether any row (in any state) was ever created for `lead_id`.
    ///
    /// Used to distinguish "no record ever created" from "record exists but
    /// already processed".
    async fn exists_for_lead(&self, lead_id: &str) -> Result<bool>;

    /// Select PENDING items whose `next_retry_at` is unset or `<= now`,
    /// oldest `created_at` first, capped at `limit`.
    async fn select_due_pending(&self, now: u64, limit: usize) -> Result<Vec<QueueItem>>;

    /// Record a successful send: status becomes SENT and `sent_at` is set.
    ///
    /// Idempotent: calling this on an item that is already SENT is a no-op
    /// and leaves the original `sent_at` untouched.
    async fn mark_sent(&self, id: &QueueItemId, sent_at: u64) -> Result<()>;

    /// Record a failed attempt.
    ///
    /// With `next_retry_at = Some(at)` the item stays PENDING with the given
    /// `retry_count` and is rescheduled for `at`. With `next_retry_at = None`
    /// the item becomes FAILED permanently. `last_error` is overwritten
    /// either way.
    async fn mark_failed(
        &self,
        id: &QueueItemId,
        error: &str,
        retry_count: u32,
        next_retry_at: Option<u64>,
    ) -> Result<()>;

    /// Remove a row permanently.
    async fn delete(&self, id: &QueueItemId) -> Result<()>;

    /// Count rows grouped by delivery status.
    async fn count_by_status(&self) -> Result<StatusCounts>;
}
