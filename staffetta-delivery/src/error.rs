//! Typed error handling for delivery operations.
//!
//! This module provides structured error types that distinguish between:
//! - Configuration errors - fail fast, never retried (retrying cannot fix them)
//! - Transport failures - recovered per item by the retry/backoff mechanism
//! - Store failures - surfaced to the caller of the failing operation
//! - Missing items - explicit not-found signal for operations that require one

use thiserror::Error;

use staffetta_store::{QueueItemId, StoreError};

use crate::transport::TransportError;

/// Top-level delivery error type.
///
/// This error type provides clear categorization of failures to enable
/// appropriate retry logic and error reporting.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Required transport credential or address is missing or malformed.
    ///
    /// Aborts the whole batch or immediate send before any network call.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The provider rejected or was unreachable for one message.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Persistence I/O failure.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// An operation that requires the item to exist referenced a missing id.
    #[error("Queue item not found: {0}")]
    NotFound(QueueItemId),
}

impl DeliveryError {
    /// Returns `true` if this error is a configuration problem.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` if this error came from the transport provider.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this error came from the store.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if this is a missing-item signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Configuration findings that make sending impossible.
///
/// Collected in full by the health surface; the processor fails fast on the
/// first one before attempting any message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Provider API key missing.
    #[error("Transport API key is not configured")]
    MissingApiKey,

    /// Verified sender address missing.
    #[error("Sender address is not configured")]
    MissingSenderAddress,

    /// Sender address fails the shape check.
    #[error("Sender address has invalid format: {0}")]
    InvalidSenderAddress(String),

    /// Operator (recipient target) address missing.
    #[error("Operator address is not configured")]
    MissingOperatorAddress,

    /// Operator address fails the shape check.
    #[error("Operator address has invalid format: {0}")]
    InvalidOperatorAddress(String),

    /// The retry schedule has no entries to index into.
    #[error("Retry backoff table is empty")]
    EmptyBackoffTable,

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorization_helpers() {
        let error = DeliveryError::Configuration(ConfigurationError::MissingApiKey);
        assert!(error.is_configuration());
        assert!(!error.is_transport());
        assert!(!error.is_store());
        assert!(!error.is_not_found());

        let error = DeliveryError::Transport(TransportError::Unreachable(
            "connection refused".to_string(),
        ));
        assert!(error.is_transport());
        assert!(!error.is_configuration());

        let error = DeliveryError::NotFound(QueueItemId::generate());
        assert!(error.is_not_found());
    }

    #[test]
    fn store_error_conversion() {
        let id = QueueItemId::generate();
        let error: DeliveryError = StoreError::NotFound(id.clone()).into();
        assert!(error.is_store());
        assert!(error.to_string().contains(&id.to_string()));
    }

    #[test]
    fn error_display() {
        let error = DeliveryError::Configuration(ConfigurationError::InvalidSenderAddress(
            "not-an-address".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Configuration error: Sender address has invalid format: not-an-address"
        );

        let error = DeliveryError::Transport(TransportError::Rejected {
            status: 401,
            message: "Key not found".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Transport failure: Provider rejected message (401): Key not found"
        );
    }
}
