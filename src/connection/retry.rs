//! Probe retry policy.
//!
//! # Backoff Schedule (defaults)
//!
//! | Failed attempt | Sleep before next attempt |
//! |----------------|---------------------------|
//! | 1              | 2s                        |
//! | 2              | 4s                        |
//! | 3              | 8s                        |
//! | 4              | 16s                       |
//! | 5              | none, resolution fails    |

use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How often the probe runs and how long to wait between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, base_delay: DEFAULT_BASE_DELAY }
    }
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1; the probe always runs once.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Sleep after failed attempt `attempt` (numbered from 1): `base * 2^attempt`.
    ///
    /// Saturates instead of overflowing for very large attempt numbers.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether `attempt` is the last one allowed.
    pub fn is_final(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Total time slept when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.delay_after(attempt))
        })
    }
}
