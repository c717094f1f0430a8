//! Retry mechanism with exponential backoff

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for transient settlement failures
///
/// Retry `n` (1-based) waits `base × 2^(n−1)`, capped at `max_backoff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff_ms: u64::try_from(base_backoff.as_millis()).unwrap_or(u64::MAX),
            max_backoff_ms: u64::try_from(max_backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(63);
        let delay = self
            .base_backoff_ms
            .checked_mul(1u64 << exponent)
            .unwrap_or(u64::MAX)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }

    /// Whether another attempt is allowed after `attempts` have been made
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 100,
            max_backoff_ms: 5_000,
        }
    }
}
