//! Queue processor orchestration

pub mod process;

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use staffetta_common::{Signal, now_unix_secs};
use staffetta_store::{Mailbox, QueueItem, QueueItemId, QueueStore, StatusCounts};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ConfigurationError, DeliveryError},
    policy::RetryPolicy,
    transport::{MailTransport, TransportConfig},
};

pub use process::BatchSummary;

const fn default_process_interval() -> u64 {
    60
}

const fn default_batch_size() -> usize {
    50
}

const fn default_process_on_enqueue() -> bool {
    true
}

/// Processor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// How often the periodic loop drains due items (in seconds)
    ///
    /// This loop is the correctness backstop: the post-enqueue pass and the
    /// webhook-triggered immediate send are both best-effort on top of it.
    #[serde(default = "default_process_interval")]
    pub process_interval_secs: u64,

    /// Maximum number of due items pulled per pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Whether enqueueing spawns a best-effort background pass
    ///
    /// Failures of that pass are logged and never surfaced to the enqueue
    /// caller; the periodic loop retries regardless.
    #[serde(default = "default_process_on_enqueue")]
    pub process_on_enqueue: bool,

    /// Retry schedule and budget
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            process_interval_secs: default_process_interval(),
            batch_size: default_batch_size(),
            process_on_enqueue: default_process_on_enqueue(),
            retry: RetryPolicy::default(),
        }
    }
}

/// What a caller supplies to enqueue one notification.
///
/// The payload arrives fully rendered; this subsystem never composes
/// business content itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub lead_id: String,
    pub recipient: Mailbox,
    pub sender: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Orchestrates delivery passes over the queue store.
///
/// Stateless per invocation: every pass re-reads due work from the store, so
/// overlapping passes (periodic, post-enqueue, webhook-triggered) are safe —
/// the store's per-row atomicity is the only serialization point.
///
/// Cheap to clone; all fields are shared.
#[derive(Debug, Clone)]
pub struct Processor {
    pub(crate) config: Arc<ProcessorConfig>,
    pub(crate) transport_config: Arc<TransportConfig>,
    pub(crate) store: Arc<dyn QueueStore>,
    pub(crate) transport: Arc<dyn MailTransport>,
}

impl Processor {
    #[must_use]
    pub fn new(
        config: ProcessorConfig,
        transport_config: TransportConfig,
        store: Arc<dyn QueueStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport_config: Arc::new(transport_config),
            store,
            transport,
        }
    }

    /// The transport configuration this processor validates against.
    #[must_use]
    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport_config
    }

    /// Collect every configuration finding (transport fields plus the retry
    /// schedule). The health surface reports the full list.
    #[must_use]
    pub fn configuration_errors(&self) -> Vec<ConfigurationError> {
        let mut findings = self.transport_config.check();
        if self.config.retry.backoff_table_secs.is_empty() {
            findings.push(ConfigurationError::EmptyBackoffTable);
        }
        findings
    }

    /// Fail fast on the first configuration problem.
    ///
    /// # Errors
    /// Returns the first configuration finding, if any.
    pub fn validate_configuration(&self) -> Result<(), ConfigurationError> {
        match self.configuration_errors().into_iter().next() {
            Some(finding) => Err(finding),
            None => Ok(()),
        }
    }

    /// Persist a new notification and make it eligible immediately.
    ///
    /// The item snapshots the current retry budget so later config changes
    /// leave it untouched. When `process_on_enqueue` is set, a background
    /// pass is spawned best-effort; its errors are logged, never returned —
    /// the periodic loop is the guaranteed backstop.
    ///
    /// # Errors
    /// Returns a store failure if the item cannot be persisted.
    pub async fn enqueue(
        &self,
        request: EnqueueRequest,
        now: u64,
    ) -> Result<QueueItem, DeliveryError> {
        let item = QueueItem {
            id: QueueItemId::generate(),
            lead_id: request.lead_id,
            recipient: request.recipient,
            sender: request.sender,
            subject: request.subject,
            html_body: request.html_body,
            text_body: request.text_body,
            status: staffetta_common::DeliveryStatus::Pending,
            retry_count: 0,
            max_retries: self.config.retry.max_retries,
            last_error: None,
            created_at: now,
            sent_at: None,
            // Eligible for the very next pass
            next_retry_at: Some(now),
        };

        self.store.insert(&item).await?;
        info!(item_id = %item.id, lead_id = %item.lead_id, "Notification queued");

        if self.config.process_on_enqueue {
            let processor = self.clone();
            tokio::spawn(async move {
                if let Err(e) = processor.process_batch(now_unix_secs()).await {
                    warn!(error = %e, "Background queue pass after enqueue failed");
                }
            });
        }

        Ok(item)
    }

    /// Fetch one item by id.
    ///
    /// # Errors
    /// Returns a store failure if the read fails.
    pub async fn get(&self, id: &QueueItemId) -> Result<Option<QueueItem>, DeliveryError> {
        Ok(self.store.get(id).await?)
    }

    /// Fetch the most recently created item for a lead.
    ///
    /// # Errors
    /// Returns a store failure if the read fails.
    pub async fn most_recent_for_lead(
        &self,
        lead_id: &str,
    ) -> Result<Option<QueueItem>, DeliveryError> {
        Ok(self.store.most_recent_for_lead(lead_id).await?)
    }

    /// Whether any item was ever created for a lead.
    ///
    /// # Errors
    /// Returns a store failure if the read fails.
    pub async fn exists_for_lead(&self, lead_id: &str) -> Result<bool, DeliveryError> {
        Ok(self.store.exists_for_lead(lead_id).await?)
    }

    /// Remove an item permanently.
    ///
    /// # Errors
    /// Returns a store failure, including not-found, if the delete fails.
    pub async fn delete(&self, id: &QueueItemId) -> Result<(), DeliveryError> {
        Ok(self.store.delete(id).await?)
    }

    /// Queue depth grouped by status, for the operator surface.
    ///
    /// # Errors
    /// Returns a store failure if the read fails.
    pub async fn stats(&self) -> Result<StatusCounts, DeliveryError> {
        Ok(self.store.count_by_status().await?)
    }

    /// Run the periodic processing loop until a shutdown signal arrives.
    ///
    /// The in-flight pass finishes before the loop exits; queue state is
    /// durable in the store, so a restart picks up exactly where this left
    /// off.
    ///
    /// # Errors
    /// Individual pass failures are logged and do not stop the loop; only
    /// being unable to keep running is an error.
    pub async fn serve(
        &self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), DeliveryError> {
        info!(
            interval_secs = self.config.process_interval_secs,
            batch_size = self.config.batch_size,
            "Queue processor starting"
        );

        let mut process_timer =
            tokio::time::interval(Duration::from_secs(self.config.process_interval_secs));

        // Skip the first tick to avoid immediate execution
        process_timer.tick().await;

        loop {
            tokio::select! {
                _ = process_timer.tick() => {
                    match self.process_batch(now_unix_secs()).await {
                        Ok(summary) if summary.total() > 0 => {
                            info!(
                                sent = summary.sent,
                                failed = summary.failed,
                                pending = summary.pending,
                                "Processed delivery queue"
                            );
                        }
                        Ok(_) => {
                            debug!("Processed delivery queue, no due items");
                        }
                        Err(e) => {
                            error!(error = %e, "Error processing delivery queue");
                        }
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            info!("Queue processor received shutdown signal");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "Queue processor shutdown channel error");
                            break;
                        }
                    }
                }
            }
        }

        info!("Queue processor shutdown complete");
        Ok(())
    }
}
