//! Service trait abstraction for queue operations
//!
//! This module provides a trait abstraction to decouple outer surfaces
//! (such as the operator HTTP endpoints) from the concrete [`Processor`]
//! implementation.

use async_trait::async_trait;
use staffetta_common::now_unix_secs;
use staffetta_store::StatusCounts;

use crate::{
    error::{ConfigurationError, DeliveryError},
    processor::{BatchSummary, Processor},
};

/// The queue operations an operator-facing surface needs.
///
/// Kept deliberately narrow: surfaces observe the queue and can trigger a
/// pass, but enqueueing and immediate dispatch stay with the components that
/// own those business events.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Queue depth grouped by delivery status.
    ///
    /// # Errors
    /// Returns a store failure if counts cannot be read.
    async fn stats(&self) -> Result<StatusCounts, DeliveryError>;

    /// Run one processing pass at the current wall-clock time.
    ///
    /// # Errors
    /// Returns a configuration error before any processing, or a store
    /// failure if due items cannot be selected.
    async fn run_batch(&self) -> Result<BatchSummary, DeliveryError>;

    /// Every current configuration finding (empty when sending is possible).
    fn configuration_errors(&self) -> Vec<ConfigurationError>;
}

#[async_trait]
impl QueueService for Processor {
    async fn stats(&self) -> Result<StatusCounts, DeliveryError> {
        self.stats().await
    }

    async fn run_batch(&self) -> Result<BatchSummary, DeliveryError> {
        self.process_batch(now_unix_secs()).await
    }

    fn configuration_errors(&self) -> Vec<ConfigurationError> {
        self.configuration_errors()
    }
}
