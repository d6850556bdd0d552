//! Delivery queue engine for outbound operator notifications
//!
//! This crate provides functionality to:
//! - Track notifications pending delivery
//! - Manage delivery attempts with a fixed backoff schedule
//! - Send messages via a transactional-email provider's HTTP API
//! - Bypass the schedule for payment-confirmed immediate dispatch

pub mod error;
pub mod policy;
pub mod processor;
pub mod service;
pub mod transport;

// Re-export error types
pub use error::{ConfigurationError, DeliveryError};
// Re-export scheduling policy
pub use policy::RetryPolicy;
// Re-export core types
pub use processor::{BatchSummary, EnqueueRequest, Processor, ProcessorConfig};
pub use service::QueueService;
pub use transport::{HttpApiTransport, MailTransport, OutboundEmail, TransportConfig, TransportError};
