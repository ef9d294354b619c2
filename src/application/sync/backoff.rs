//! Retry schedule for the change-feed client.

use std::time::Duration;

use crate::infrastructure::config::realtime::ReconnectionConfig;

/// Capped exponential backoff with a bounded number of attempts.
///
/// Attempt `n` (1-based) waits `min(base * 2^(n-1), max_delay)`. Once
/// `max_attempts` retries have been handed out, [`next_delay`](Self::next_delay)
/// returns `None` until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectionConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectionConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Retries scheduled since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Whether every automatic retry has been used.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Claim the next retry and return how long to wait before it.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.delay_for(self.attempts))
    }

    /// Delay for the given 1-based attempt number.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay_ms = self
            .config
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}
