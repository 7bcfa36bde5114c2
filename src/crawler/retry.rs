//! Retry policy with exponential backoff and jitter
//!
//! | Outcome | Condition | Decision |
//! |---------|-----------|----------|
//! | Retryable failure | `attempt < max_retries` | Retry after `base * 2^attempt + jitter` |
//! | Retryable failure | `attempt >= max_retries` | Exhausted, reported as permanent |
//! | Permanent failure / success | - | Terminal, no retry |

use crate::config::RetryConfig;
use crate::state::{InvalidTransition, RetryState};
use std::time::Duration;

/// What to do with a target after a retryable failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Issue the target again once `delay` has elapsed
    RetryAfter(Duration),

    /// Give up; the target counts as a permanent failure
    Exhausted,
}

/// Decides whether and when a failed target is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_retries: u32,
    max_jitter: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy
    ///
    /// # Arguments
    ///
    /// * `base_delay` - Delay before the first retry, doubled for each later one
    /// * `max_retries` - Retries allowed before a target is exhausted; 0 disables retries
    /// * `max_jitter` - Upper bound of the uniform random jitter added to each delay
    pub fn new(base_delay: Duration, max_retries: u32, max_jitter: Duration) -> Self {
        Self {
            base_delay,
            max_retries,
            max_jitter,
            max_backoff: Duration::from_secs(300),
        }
    }

    /// Caps the exponential part of the delay
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Builds a policy from the `[retry]` configuration section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            config.max_retries,
            Duration::from_millis(config.max_jitter_ms),
        )
        .with_max_backoff(Duration::from_millis(config.max_backoff_ms))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay for the retry following `attempt` earlier retries, without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(0..=max))
    }

    /// Applies a retryable failure to a target's retry state
    ///
    /// Moves the state Idle -> Waiting (returning the delay to wait out) or
    /// Idle -> Exhausted once `max_retries` retries have been issued. The
    /// caller moves it back to Idle with [`RetryState::reissue`] when the
    /// target is issued again.
    pub fn on_retryable_failure(
        &self,
        state: &mut RetryState,
    ) -> Result<RetryDecision, InvalidTransition> {
        if state.attempt() >= self.max_retries {
            state.exhaust()?;
            return Ok(RetryDecision::Exhausted);
        }

        let delay = self.backoff(state.attempt()) + self.jitter();
        state.schedule(delay)?;
        Ok(RetryDecision::RetryAfter(delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
