//! Delivery status for queued notifications

use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Delivery state of a queued notification.
///
/// An item starts `Pending` and moves exactly once to one of the two
/// terminal states: `Sent` on a successful provider call, or `Failed`
/// once its retry budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Waiting for a (re)delivery attempt.
    Pending,
    /// Accepted by the provider; `sent_at` records when.
    Sent,
    /// Retry budget exhausted; `last_error` records why.
    Failed,
}

impl DeliveryStatus {
    /// Whether no further automatic processing will happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Pending => write!(fmt, "PENDING"),
            Self::Sent => write!(fmt, "SENT"),
            Self::Failed => write!(fmt, "FAILED"),
        }
    }
}
