//! Test support: scripted transport and processor wiring
#![allow(dead_code)] // Test utility module - not all helpers used in every test

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use staffetta_delivery::{
    MailTransport, OutboundEmail, Processor, ProcessorConfig, RetryPolicy, TransportConfig,
    TransportError,
};
use staffetta_store::{MemoryQueueStore, QueueStore};

/// A transport whose outcomes are scripted up front.
///
/// Outcomes are consumed in call order; once the script is exhausted the
/// transport falls back to its default behavior (accept or refuse). Every
/// call is recorded so tests can assert on attempt counts and recipients.
#[derive(Debug)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    refuse_by_default: bool,
    attempts: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Accepts every message.
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            refuse_by_default: false,
            attempts: Mutex::new(Vec::new()),
        })
    }

    /// Refuses every message as unreachable.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            refuse_by_default: true,
            attempts: Mutex::new(Vec::new()),
        })
    }

    /// Plays the given outcomes first, then accepts.
    pub fn scripted(outcomes: Vec<Result<(), TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            refuse_by_default: false,
            attempts: Mutex::new(Vec::new()),
        })
    }

    /// A scripted rejection with provider detail.
    pub fn rejection(status: u16, message: &str) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            status,
            message: message.to_string(),
        })
    }

    /// A scripted network failure.
    pub fn unreachable(message: &str) -> Result<(), TransportError> {
        Err(TransportError::Unreachable(message.to_string()))
    }

    /// Recipient addresses of every attempted send, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Number of sends attempted so far.
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, email: &OutboundEmail<'_>) -> Result<(), TransportError> {
        self.attempts
            .lock()
            .unwrap()
            .push(email.recipient.email.clone());

        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome;
        }

        if self.refuse_by_default {
            Err(TransportError::Unreachable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A transport configuration that passes validation.
pub fn valid_transport_config() -> TransportConfig {
    TransportConfig {
        api_key: "xkeysib-test".to_string(),
        sender_email: "noreply@example.com".to_string(),
        operator_email: "operator@example.com".to_string(),
        ..TransportConfig::default()
    }
}

/// Processor config with the background post-enqueue pass disabled so tests
/// drive every pass explicitly.
pub fn manual_processor_config() -> ProcessorConfig {
    ProcessorConfig {
        process_on_enqueue: false,
        ..ProcessorConfig::default()
    }
}

/// Wire a processor over a fresh memory store and the given transport.
pub fn processor_with(
    config: ProcessorConfig,
    transport_config: TransportConfig,
    transport: Arc<MockTransport>,
) -> (Processor, Arc<MemoryQueueStore>) {
    let store = Arc::new(MemoryQueueStore::new());
    let processor = Processor::new(
        config,
        transport_config,
        store.clone() as Arc<dyn QueueStore>,
        transport,
    );
    (processor, store)
}

/// Shorthand: manual config, valid transport config.
pub fn manual_processor(transport: Arc<MockTransport>) -> (Processor, Arc<MemoryQueueStore>) {
    processor_with(manual_processor_config(), valid_transport_config(), transport)
}

/// A retry policy with a short, distinctive table for delay assertions.
pub fn short_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        backoff_table_secs: vec![10, 100],
    }
}
