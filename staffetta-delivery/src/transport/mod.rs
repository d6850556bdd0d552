//! Outbound message transport
//!
//! The [`MailTransport`] trait is the seam between the queue processor and
//! whichever provider actually carries the message. Implementations perform
//! exactly one send per call and never retry internally — all retry policy
//! lives in the processor.

pub mod config;
pub mod http;

use async_trait::async_trait;
use staffetta_store::{Mailbox, QueueItem};
use thiserror::Error;

pub use config::TransportConfig;
pub use http::HttpApiTransport;

/// A fully-formed message ready to hand to a provider.
///
/// Borrowed view over a queue item's immutable payload fields.
#[derive(Debug, Clone, Copy)]
pub struct OutboundEmail<'a> {
    pub sender: &'a Mailbox,
    pub recipient: &'a Mailbox,
    pub subject: &'a str,
    pub html_body: &'a str,
    pub text_body: &'a str,
}

impl<'a> From<&'a QueueItem> for OutboundEmail<'a> {
    fn from(item: &'a QueueItem) -> Self {
        Self {
            sender: &item.sender,
            recipient: &item.recipient,
            subject: &item.subject,
            html_body: &item.html_body,
            text_body: &item.text_body,
        }
    }
}

/// Failure of a single provider call.
///
/// The status classification is advisory — it feeds diagnostics, never the
/// retry decision, which is uniform regardless of failure cause.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The provider answered with a non-2xx status.
    #[error("Provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached at all.
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// The provider did not answer within the configured deadline.
    #[error("Provider request timed out: {0}")]
    Timeout(String),
}

impl TransportError {
    /// HTTP status of a rejection, if the provider answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Unreachable(_) | Self::Timeout(_) => None,
        }
    }

    /// Advisory: the provider refused our credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Advisory: the provider refused the message content or sender.
    #[must_use]
    pub fn is_content_rejection(&self) -> bool {
        self.status() == Some(400)
    }
}

/// One outbound send via an external provider.
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Attempt to hand `email` to the provider.
    ///
    /// Must not retry internally, and must surface enough detail (status
    /// class, provider message) for actionable diagnostics.
    ///
    /// # Errors
    /// Returns a [`TransportError`] when the provider rejects the message or
    /// cannot be reached.
    async fn send(&self, email: &OutboundEmail<'_>) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_classification() {
        let auth = TransportError::Rejected {
            status: 401,
            message: "Key not found".to_string(),
        };
        assert!(auth.is_auth_failure());
        assert!(!auth.is_content_rejection());
        assert_eq!(auth.status(), Some(401));

        let content = TransportError::Rejected {
            status: 400,
            message: "sender not valid".to_string(),
        };
        assert!(content.is_content_rejection());
        assert!(!content.is_auth_failure());

        let unreachable = TransportError::Unreachable("connection refused".to_string());
        assert_eq!(unreachable.status(), None);
        assert!(!unreachable.is_auth_failure());
    }

    #[test]
    fn outbound_view_borrows_item_payload() {
        let item = QueueItem {
            id: staffetta_store::QueueItemId::generate(),
            lead_id: "lead-1".to_string(),
            recipient: Mailbox::new("Operator", "operator@example.com"),
            sender: Mailbox::new("Staffetta", "noreply@example.com"),
            subject: "New case".to_string(),
            html_body: "<p>hi</p>".to_string(),
            text_body: "hi".to_string(),
            status: staffetta_common::DeliveryStatus::Pending,
            retry_count: 0,
            max_retries: 5,
            last_error: None,
            created_at: 0,
            sent_at: None,
            next_retry_at: None,
        };

        let email = OutboundEmail::from(&item);
        assert_eq!(email.recipient.email, "operator@example.com");
        assert_eq!(email.subject, "New case");
    }
}
