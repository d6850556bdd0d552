//! Health check logic

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Health checker that tracks system component status
///
/// Thread-safe readiness tracking for the store, the processor loop, and the
/// transport configuration, plus a pending-backlog gauge.
#[derive(Debug)]
pub struct HealthChecker {
    /// Whether the queue store initialized and is usable
    store_ready: Arc<AtomicBool>,

    /// Whether the processor loop is running
    processor_ready: Arc<AtomicBool>,

    /// Whether the transport configuration validates
    transport_ready: Arc<AtomicBool>,

    /// Current number of pending items
    queue_size: Arc<AtomicU64>,

    /// Maximum pending backlog before readiness fails
    max_queue_size: u64,
}

impl HealthChecker {
    /// Create a new health checker with the specified backlog ceiling
    #[must_use]
    pub fn new(max_queue_size: u64) -> Self {
        Self {
            store_ready: Arc::new(AtomicBool::new(false)),
            processor_ready: Arc::new(AtomicBool::new(false)),
            transport_ready: Arc::new(AtomicBool::new(false)),
            queue_size: Arc::new(AtomicU64::new(0)),
            max_queue_size,
        }
    }

    /// Mark the store as ready (initialized, directory writable)
    pub fn set_store_ready(&self, ready: bool) {
        self.store_ready.store(ready, Ordering::Relaxed);
        tracing::debug!(ready, "Store readiness updated");
    }

    /// Mark the processor loop as ready
    pub fn set_processor_ready(&self, ready: bool) {
        self.processor_ready.store(ready, Ordering::Relaxed);
        tracing::debug!(ready, "Processor readiness updated");
    }

    /// Mark the transport configuration as valid
    pub fn set_transport_ready(&self, ready: bool) {
        self.transport_ready.store(ready, Ordering::Relaxed);
        tracing::debug!(ready, "Transport readiness updated");
    }

    /// Update the current pending backlog
    pub fn set_queue_size(&self, size: u64) {
        self.queue_size.store(size, Ordering::Relaxed);
    }

    /// Check if the application is alive
    ///
    /// For liveness, responding at all is the signal; if we can't respond,
    /// the HTTP server itself is dead, which the orchestrator detects via
    /// timeout.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        true
    }

    /// Check if the application is ready to accept traffic
    ///
    /// Returns true if all components are ready and the pending backlog is
    /// below the ceiling.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let store_ok = self.store_ready.load(Ordering::Relaxed);
        let processor_ok = self.processor_ready.load(Ordering::Relaxed);
        let transport_ok = self.transport_ready.load(Ordering::Relaxed);
        let current_queue = self.queue_size.load(Ordering::Relaxed);
        let queue_ok = current_queue < self.max_queue_size;

        let ready = store_ok && processor_ok && transport_ok && queue_ok;

        if !ready {
            tracing::debug!(
                store_ready = store_ok,
                processor_ready = processor_ok,
                transport_ready = transport_ok,
                queue_size = current_queue,
                max_queue_size = self.max_queue_size,
                "Readiness check failed"
            );
        }

        ready
    }

    /// Get detailed readiness status for debugging
    #[must_use]
    pub fn get_status(&self) -> HealthStatus {
        HealthStatus {
            alive: self.is_alive(),
            ready: self.is_ready(),
            store_ready: self.store_ready.load(Ordering::Relaxed),
            processor_ready: self.processor_ready.load(Ordering::Relaxed),
            transport_ready: self.transport_ready.load(Ordering::Relaxed),
            queue_size: self.queue_size.load(Ordering::Relaxed),
            max_queue_size: self.max_queue_size,
        }
    }
}

/// Detailed health status information
#[derive(Debug, Clone, serde::Serialize)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Status struct intentionally has multiple boolean fields for clarity"
)]
pub struct HealthStatus {
    /// Whether the application is alive
    pub alive: bool,

    /// Whether the application is ready
    pub ready: bool,

    /// Whether the store is ready
    pub store_ready: bool,

    /// Whether the processor loop is ready
    pub processor_ready: bool,

    /// Whether the transport configuration validates
    pub transport_ready: bool,

    /// Current pending backlog
    pub queue_size: u64,

    /// Backlog ceiling for readiness
    pub max_queue_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_until_all_components_are() {
        let checker = HealthChecker::new(100);
        assert!(checker.is_alive());
        assert!(!checker.is_ready());

        checker.set_store_ready(true);
        checker.set_processor_ready(true);
        assert!(!checker.is_ready());

        checker.set_transport_ready(true);
        assert!(checker.is_ready());
    }

    #[test]
    fn backlog_above_ceiling_fails_readiness() {
        let checker = HealthChecker::new(10);
        checker.set_store_ready(true);
        checker.set_processor_ready(true);
        checker.set_transport_ready(true);

        checker.set_queue_size(9);
        assert!(checker.is_ready());

        checker.set_queue_size(10);
        assert!(!checker.is_ready());
    }

    #[test]
    fn status_reflects_component_flags() {
        let checker = HealthChecker::new(100);
        checker.set_store_ready(true);
        checker.set_queue_size(42);

        let status = checker.get_status();
        assert!(status.alive);
        assert!(!status.ready);
        assert!(status.store_ready);
        assert!(!status.processor_ready);
        assert_eq!(status.queue_size, 42);
        assert_eq!(status.max_queue_size, 100);
    }
}
