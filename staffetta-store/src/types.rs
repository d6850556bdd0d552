use serde::{Deserialize, Serialize};
use staffetta_common::DeliveryStatus;

/// Identifier for a queued notification
///
/// This is a globally unique identifier (ULID) that serves as both the row
/// key and the filename for file-backed stores. ULIDs are lexicographically
/// sortable by creation time and collision-resistant, which gives cheap
/// tie-breaking for items created within the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueItemId {
    id: ulid::Ulid,
}

impl QueueItemId {
    /// Parse an item id from a filename like `01ARYZ6S41.bin`
    ///
    /// Validates that the filename is a valid ULID to prevent path traversal.
    ///
    /// # Security
    /// This function explicitly rejects:
    /// - Path separators (/ and \)
    /// - Directory traversal patterns (..)
    /// - Invalid ULID format
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.contains('/') || filename.contains('\\') {
            return None;
        }

        if filename.contains("..") {
            return None;
        }

        let stem = filename.strip_suffix(".bin")?;

        let id = ulid::Ulid::from_string(stem).ok()?;

        Some(Self { id })
    }

    /// Create an item id from an existing ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique item id
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }
}

impl std::fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for QueueItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for QueueItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// A display name paired with an email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

impl Mailbox {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One unit of outbound notification work
///
/// The payload fields (addresses, subject, bodies) are immutable after
/// creation; only the delivery-state fields are mutated, and only by the
/// processor or an explicit delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique row key, generated at enqueue time
    pub id: QueueItemId,
    /// Foreign reference to the business record this notification is about
    pub lead_id: String,
    /// Who receives the notification
    pub recipient: Mailbox,
    /// Who the notification is from (must be a provider-verified address)
    pub sender: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    /// Current delivery state
    pub status: DeliveryStatus,
    /// Failed attempts so far; never exceeds `max_retries`
    pub retry_count: u32,
    /// Retry budget, snapshotted from configuration at creation so config
    /// changes never affect in-flight items
    pub max_retries: u32,
    /// Message of the most recent failed attempt
    pub last_error: Option<String>,
    /// Unix timestamp of creation
    pub created_at: u64,
    /// Unix timestamp of the successful send, set exactly once
    pub sent_at: Option<u64>,
    /// Unix timestamp of the next scheduled attempt (`None` means eligible
    /// immediately for a pending item)
    pub next_retry_at: Option<u64>,
}

impl QueueItem {
    /// Whether this item is eligible for processing at `now`.
    #[must_use]
    pub fn is_due(&self, now: u64) -> bool {
        self.status == DeliveryStatus::Pending && self.next_retry_at.is_none_or(|at| at <= now)
    }

    /// Ordering key for FIFO selection: creation time, ties broken by id.
    #[must_use]
    pub fn fifo_key(&self) -> (u64, &QueueItemId) {
        (self.created_at, &self.id)
    }
}

/// Queue depth broken down by delivery status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub(crate) fn tally(items: impl IntoIterator<Item = DeliveryStatus>) -> Self {
        let mut counts = Self::default();
        for status in items {
            match status {
                DeliveryStatus::Pending => counts.pending += 1,
                DeliveryStatus::Sent => counts.sent += 1,
                DeliveryStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
