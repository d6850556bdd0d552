//! Retry policy for delivery operations.
//!
//! This module provides a clean abstraction over retry configuration and
//! scheduling, making it easy to test and reason about retry behavior
//! independently of the queue processor. Everything here is pure — no I/O,
//! no clock access; callers pass `now` in.

use serde::{Deserialize, Serialize};

mod defaults {
    pub(super) fn max_retries() -> u32 {
        5
    }

    pub(super) fn backoff_table_secs() -> Vec<u64> {
        vec![60, 300, 900, 3600, 14400]
    }
}

/// Retry policy configuration for delivery operations.
///
/// The schedule is a fixed ascending table of delays indexed by the retry
/// count; attempts past the end of the table reuse the last (longest) entry,
/// which caps backoff growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries before an item fails permanently.
    ///
    /// Snapshotted onto each item at enqueue time, so changing this does not
    /// affect items already in flight.
    ///
    /// Default: 5
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff table in seconds, indexed by retry count.
    ///
    /// Default: `[60, 300, 900, 3600, 14400]`
    /// (1 minute, 5 minutes, 15 minutes, 1 hour, 4 hours)
    #[serde(default = "defaults::backoff_table_secs")]
    pub backoff_table_secs: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            backoff_table_secs: defaults::backoff_table_secs(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an item whose pre-attempt retry count is `retry_count` has
    /// exhausted its budget of `max_retries`.
    ///
    /// `max_retries` comes from the item (its snapshot), not from this
    /// policy, so in-flight items keep the budget they were created with.
    #[must_use]
    pub const fn is_terminal(retry_count: u32, max_retries: u32) -> bool {
        retry_count >= max_retries
    }

    /// Delay before the next attempt, looked up by retry count.
    ///
    /// Counts past the end of the table reuse the last entry. An empty table
    /// yields zero; configuration validation rejects that before any
    /// processing starts.
    #[must_use]
    pub fn next_delay_secs(&self, retry_count: u32) -> u64 {
        let index = usize::try_from(retry_count)
            .unwrap_or(usize::MAX)
            .min(self.backoff_table_secs.len().saturating_sub(1));
        self.backoff_table_secs.get(index).copied().unwrap_or(0)
    }

    /// Unix timestamp of the next attempt for an item that just failed.
    #[must_use]
    pub fn next_retry_at(&self, retry_count: u32, now: u64) -> u64 {
        now.saturating_add(self.next_delay_secs(retry_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.backoff_table_secs, vec![60, 300, 900, 3600, 14400]);
    }

    #[test]
    fn delays_walk_the_table() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_delay_secs(0), 60);
        assert_eq!(policy.next_delay_secs(1), 300);
        assert_eq!(policy.next_delay_secs(2), 900);
        assert_eq!(policy.next_delay_secs(3), 3600);
        assert_eq!(policy.next_delay_secs(4), 14400);
    }

    #[test]
    fn delays_past_the_table_reuse_the_last_entry() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_delay_secs(5), 14400);
        assert_eq!(policy.next_delay_secs(100), 14400);
        assert_eq!(policy.next_delay_secs(u32::MAX), 14400);
    }

    #[test]
    fn delays_are_non_decreasing_and_bounded() {
        let policy = RetryPolicy::default();
        let max = *policy.backoff_table_secs.last().unwrap();

        let mut previous = 0;
        for retry_count in 0..32 {
            let delay = policy.next_delay_secs(retry_count);
            assert!(delay >= previous, "delay must never shrink");
            assert!(delay <= max, "delay must never exceed the table maximum");
            previous = delay;
        }
    }

    #[test]
    fn terminal_boundary() {
        assert!(!RetryPolicy::is_terminal(0, 5));
        assert!(!RetryPolicy::is_terminal(4, 5));
        assert!(RetryPolicy::is_terminal(5, 5));
        assert!(RetryPolicy::is_terminal(6, 5));

        // A zero budget fails on the first attempt
        assert!(RetryPolicy::is_terminal(0, 0));
    }

    #[test]
    fn next_retry_timestamp_is_now_plus_delay() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_retry_at(0, 1_000), 1_060);
        assert_eq!(policy.next_retry_at(2, 1_000), 1_900);
        assert_eq!(policy.next_retry_at(0, u64::MAX), u64::MAX);
    }

    #[test]
    fn custom_table_is_respected() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_table_secs: vec![10, 100],
        };

        assert_eq!(policy.next_delay_secs(0), 10);
        assert_eq!(policy.next_delay_secs(1), 100);
        assert_eq!(policy.next_delay_secs(9), 100);
    }

    #[test]
    fn empty_table_yields_zero() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_table_secs: Vec::new(),
        };
        assert_eq!(policy.next_delay_secs(3), 0);
    }
}
