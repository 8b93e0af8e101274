//! Bounded retry policy.
//!
//! # Responsibilities
//! - Cap the number of attempts
//! - Pick the pause before the next attempt from what went wrong
//! - Bound every single attempt with a timeout
//!
//! # Design Decisions
//! - Fixed delays, not exponential: attempts probe a random routing
//!   decision, they do not wait for a backend to recover
//! - A "miss" (answered, but by the wrong replica) waits less than an error

use std::time::Duration;

use crate::resilience::backoff::jittered;

/// Why an attempt did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// A response arrived from an unwanted replica.
    Miss,
    /// Transport error, timeout or error status.
    Error,
}

/// Retry settings for client-side loops.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause after a miss.
    pub miss_delay: Duration,
    /// Pause after an error.
    pub error_delay: Duration,
    /// Upper bound for one attempt.
    pub attempt_timeout: Duration,
    /// Random extra delay as a share of the base delay (0.0 = none).
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            miss_delay: Duration::from_millis(300),
            error_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(5),
            jitter_ratio: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with no pauses, for tests and scripted runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            miss_delay: Duration::ZERO,
            error_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Pause before the attempt following `failure`.
    pub fn delay_for(&self, failure: AttemptFailure) -> Duration {
        let base = match failure {
            AttemptFailure::Miss => self.miss_delay,
            AttemptFailure::Error => self.error_delay,
        };
        jittered(base, self.jitter_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for(AttemptFailure::Miss), Duration::from_millis(300));
        assert_eq!(policy.delay_for(AttemptFailure::Error), Duration::from_millis(500));
    }

    #[test]
    fn test_immediate() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(AttemptFailure::Error), Duration::ZERO);
    }
}
