//! Batch processing and immediate dispatch

use serde::Serialize;
use staffetta_store::{QueueItem, QueueItemId};
use tracing::{debug, error, info, warn};

use crate::{
    error::DeliveryError,
    policy::RetryPolicy,
    processor::Processor,
    transport::{OutboundEmail, TransportError},
};

/// Outcome counts of one processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Items accepted by the provider this pass
    pub sent: u32,
    /// Items that exhausted their retry budget this pass
    pub failed: u32,
    /// Items rescheduled for a later attempt
    pub pending: u32,
}

impl BatchSummary {
    /// Total items this pass acted on.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.sent + self.failed + self.pending
    }
}

impl Processor {
    /// Run one bounded pull-and-process pass over due items.
    ///
    /// Configuration is validated first; an invalid credential aborts the
    /// whole pass before any network call, leaving every item untouched.
    /// After that, items are processed sequentially in FIFO order and one
    /// item's failure never aborts the rest — per-item outcomes land in the
    /// returned summary, not in the error channel.
    ///
    /// # Errors
    /// Returns a configuration error before any processing, or a store
    /// failure if due items cannot be selected at all.
    pub async fn process_batch(&self, now: u64) -> Result<BatchSummary, DeliveryError> {
        self.validate_configuration()?;

        let due = self
            .store
            .select_due_pending(now, self.config.batch_size)
            .await?;
        debug!(due = due.len(), "Found due items to process");

        let mut summary = BatchSummary::default();
        for item in &due {
            self.attempt(item, now, &mut summary).await;
        }

        Ok(summary)
    }

    /// Send one item outside the scheduled batch path.
    ///
    /// Used when an external payment event confirms urgency. On success the
    /// row is durably marked sent and then deleted — in that order, so a
    /// crash in between leaves a SENT-but-undeleted row rather than losing
    /// the outcome. On failure the same retry bookkeeping as the batch path
    /// applies and the error is returned, letting the caller decide that
    /// delivery failure is non-fatal to the triggering business event (the
    /// periodic loop remains the backstop).
    ///
    /// # Errors
    /// - [`DeliveryError::NotFound`] if no item has this id
    /// - [`DeliveryError::Configuration`] before any network call
    /// - [`DeliveryError::Transport`] if the provider call fails
    /// - [`DeliveryError::Store`] if recording the success fails
    pub async fn send_immediate(&self, id: &QueueItemId, now: u64) -> Result<(), DeliveryError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DeliveryError::NotFound(id.clone()))?;

        self.validate_configuration()?;

        match self.transport.send(&OutboundEmail::from(&item)).await {
            Ok(()) => {
                self.store.mark_sent(id, now).await?;
                info!(item_id = %id, lead_id = %item.lead_id, "Notification sent immediately");

                if let Err(e) = self.store.delete(id).await {
                    // The send is already durably recorded; a leftover SENT
                    // row is harmless and visible in stats
                    warn!(item_id = %id, error = %e, "Failed to delete item after immediate send");
                }

                Ok(())
            }
            Err(e) => {
                let mut summary = BatchSummary::default();
                self.book_failure(&item, &e, now, &mut summary).await;
                Err(e.into())
            }
        }
    }

    /// One delivery attempt for one item, with isolated error handling.
    async fn attempt(&self, item: &QueueItem, now: u64, summary: &mut BatchSummary) {
        debug!(
            item_id = %item.id,
            attempt = item.retry_count + 1,
            max_attempts = item.max_retries + 1,
            "Attempting delivery"
        );

        match self.transport.send(&OutboundEmail::from(item)).await {
            Ok(()) => {
                if let Err(e) = self.store.mark_sent(&item.id, now).await {
                    // The message went out; the worst case is the next pass
                    // sending a duplicate, which at-least-once permits
                    warn!(
                        item_id = %item.id,
                        error = %e,
                        "Sent but failed to record success"
                    );
                }
                summary.sent += 1;
                info!(
                    item_id = %item.id,
                    recipient = %item.recipient.email,
                    "Notification sent"
                );
            }
            Err(e) => self.book_failure(item, &e, now, summary).await,
        }
    }

    /// Retry bookkeeping for a failed attempt.
    ///
    /// The terminal decision uses the pre-increment retry count against the
    /// item's snapshotted budget, and so does the backoff lookup for a
    /// reschedule; only the stored count is incremented. An item therefore
    /// gets `max_retries + 1` total attempts and its stored `retry_count`
    /// never exceeds `max_retries`.
    async fn book_failure(
        &self,
        item: &QueueItem,
        transport_error: &TransportError,
        now: u64,
        summary: &mut BatchSummary,
    ) {
        let message = transport_error.to_string();

        if RetryPolicy::is_terminal(item.retry_count, item.max_retries) {
            match self
                .store
                .mark_failed(&item.id, &message, item.retry_count, None)
                .await
            {
                Ok(()) => {
                    summary.failed += 1;
                    error!(
                        item_id = %item.id,
                        attempts = item.retry_count + 1,
                        error = %message,
                        "Notification permanently failed"
                    );
                }
                Err(e) => {
                    summary.pending += 1;
                    warn!(
                        item_id = %item.id,
                        error = %e,
                        "Failed to record terminal failure; item stays pending"
                    );
                }
            }
        } else {
            let next_retry_at = self.config.retry.next_retry_at(item.retry_count, now);
            match self
                .store
                .mark_failed(&item.id, &message, item.retry_count + 1, Some(next_retry_at))
                .await
            {
                Ok(()) => {
                    summary.pending += 1;
                    warn!(
                        item_id = %item.id,
                        retry_count = item.retry_count + 1,
                        next_retry_at,
                        error = %message,
                        "Delivery failed, retry scheduled"
                    );
                }
                Err(e) => {
                    summary.pending += 1;
                    warn!(
                        item_id = %item.id,
                        error = %e,
                        "Failed to record retry bookkeeping"
                    );
                }
            }
        }
    }
}
