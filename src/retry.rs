//! Bounded retry policy for acknowledgement waits.
//!
//! An acknowledgement phase re-sends its message to the nodes that have not
//! answered each time a wait window expires.  Windows start at
//! `initial_timeout` and double on every silent expiry (exponential
//! back-off) up to `max_timeout`.  After `max_attempts` silent windows the
//! phase gives up and the round fails.

use std::time::Duration;

/// Adjustable retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Length of the first wait window.
    pub initial_timeout: Duration,
    /// Ceiling for the wait window after repeated back-off.
    pub max_timeout: Duration,
    /// Number of windows (including the first) before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(8),
            max_attempts: 6,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            current: self.initial_timeout,
            attempt: 1,
        }
    }
}

/// Running state of one retried phase.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    current: Duration,
    attempt: u32,
}

impl Backoff {
    /// Length of the window currently in force.
    pub fn timeout(&self) -> Duration {
        self.current
    }

    /// 1-based number of the window currently in force.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a silent window.  Returns `false` once the attempt budget is
    /// spent; otherwise doubles the window (capped) and returns `true`.
    pub fn next_attempt(&mut self) -> bool {
        if self.attempt >= self.policy.max_attempts {
            return false;
        }
        self.attempt += 1;
        self.current = (self.current * 2).min(self.policy.max_timeout);
        true
    }

    /// Progress was made: drop back to the initial window.
    pub fn reset(&mut self) {
        self.current = self.policy.initial_timeout;
        self.attempt = 1;
    }
}
