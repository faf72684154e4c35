//! Reconnection Policy
//!
//! Fixed-delay retry budget for the ticker stream. Every failed connection
//! waits the same delay before the next attempt; once the budget is spent
//! the policy resets itself so a later manual reconnect starts fresh.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before every reconnection attempt.
    pub delay: Duration,
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl ReconnectConfig {
    /// Create a new configuration.
    #[must_use]
    pub const fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }
}

/// Reconnection policy with a fixed delay and a bounded retry count.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ticker_board::infrastructure::upbit::reconnect::{ReconnectConfig, ReconnectPolicy};
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::new(Duration::from_secs(5), 1));
///
/// assert_eq!(policy.next_delay(), Some(Duration::from_secs(5)));
/// assert_eq!(policy.next_delay(), None);
///
/// // Budget exhausted; the policy is ready for a fresh cycle.
/// assert_eq!(policy.retry_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    retry_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            retry_count: 0,
        }
    }

    /// Register a failure and return the delay before the next attempt.
    ///
    /// Returns `None` once `max_retries` retries have been spent; the
    /// counter is reset to zero at that point.
    #[must_use]
    pub const fn next_delay(&mut self) -> Option<Duration> {
        self.retry_count += 1;
        if self.retry_count <= self.config.max_retries {
            Some(self.config.delay)
        } else {
            self.retry_count = 0;
            None
        }
    }

    /// Reset the policy after a successful connection.
    pub const fn reset(&mut self) {
        self.retry_count = 0;
    }

    /// Retries spent in the current failure cycle.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Total connection attempts before the policy gives up.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.config.max_retries.saturating_add(1)
    }
}
