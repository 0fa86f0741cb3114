//! Retry policy for provider and tool HTTP calls.

use std::time::Duration;

/// How often to try an operation and how long to wait between tries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// One attempt, no retry.
    None,
    /// Up to `max_attempts` attempts in total, `interval` apart.
    Fixed {
        max_attempts: usize,
        interval: Duration,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    /// Whether another attempt follows the failed attempt number `attempt` (0-based).
    pub fn should_retry(&self, attempt: usize) -> bool {
        match self {
            RetryPolicy::None => false,
            RetryPolicy::Fixed { max_attempts, .. } => attempt + 1 < *max_attempts,
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
        }
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Fixed { max_attempts, .. } => (*max_attempts).max(1),
        }
    }
}

impl Default for RetryPolicy {
    /// Three attempts, one second apart.
    fn default() -> Self {
        RetryPolicy::fixed(3, Duration::from_secs(1))
    }
}
