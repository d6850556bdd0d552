pub mod logging;
pub mod status;

pub use status::DeliveryStatus;
pub use tracing;

/// Control signal broadcast to every long-running component.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}

/// Current wall-clock time as whole seconds since the Unix epoch.
///
/// All queue timestamps (`created_at`, `sent_at`, `next_retry_at`) are
/// expressed in this unit.
#[must_use]
pub fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
