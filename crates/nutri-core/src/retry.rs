//! Retry policy for inference attempts
//!
//! The policy is a pure decision object: configuration and attempt state in,
//! [`RetryDecision`] out. Sleeping is delegated to a [`Sleeper`] so the loop
//! can be tested without real timers.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{AttemptState, ErrorClass, RequestMode};

/// Upper bound of the random jitter added to each backoff delay
pub const MAX_JITTER_MS: u64 = 250;

/// What the client does after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then try again in the same mode
    Retry { delay: Duration },
    /// Drop the output schema and try again immediately
    SwitchMode,
    /// Availability budget spent; fall back to the local heuristic
    Degrade,
    /// Surface the error to the caller
    Fail,
}

/// Backoff and attempt budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff_base_ms: 300,
            backoff_max_ms: 4000,
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempt + jitter, max)`; jitter is clamped to `MAX_JITTER_MS`
    pub fn backoff_delay(&self, attempt_index: u32, jitter_ms: u64) -> Duration {
        let exponential = 1u64
            .checked_shl(attempt_index)
            .and_then(|factor| self.backoff_base_ms.checked_mul(factor))
            .unwrap_or(u64::MAX);
        let delay = exponential
            .saturating_add(jitter_ms.min(MAX_JITTER_MS))
            .min(self.backoff_max_ms);
        Duration::from_millis(delay)
    }

    /// Draw a random jitter in `0..=MAX_JITTER_MS`
    pub fn sample_jitter_ms() -> u64 {
        rand::thread_rng().gen_range(0..=MAX_JITTER_MS)
    }

    /// Decide what to do after the attempt described by `state` failed with `class`
    pub fn decide(&self, state: &AttemptState, class: ErrorClass, jitter_ms: u64) -> RetryDecision {
        match class {
            ErrorClass::Availability if state.attempt_index < self.max_retries => RetryDecision::Retry {
                delay: self.backoff_delay(state.attempt_index, jitter_ms),
            },
            ErrorClass::Availability => RetryDecision::Degrade,
            // Only one switch per call; a second rejection is not recoverable
            ErrorClass::SchemaRejection if state.mode == RequestMode::Structured => {
                RetryDecision::SwitchMode
            }
            ErrorClass::SchemaRejection | ErrorClass::Content | ErrorClass::Hard => RetryDecision::Fail,
        }
    }

    /// Most network attempts a single call can make
    pub fn max_attempts(&self) -> u32 {
        // availability budget plus the one schema-switch retry
        self.max_retries.saturating_add(2)
    }

    /// Longest total backoff sleep a single call can accumulate
    pub fn max_total_backoff(&self) -> Duration {
        let cap = Duration::from_millis(self.backoff_max_ms);
        let mut total = Duration::ZERO;
        for attempt in 0..self.max_retries {
            let delay = self.backoff_delay(attempt, MAX_JITTER_MS);
            if delay >= cap {
                // every later delay is capped too
                return total.saturating_add(cap.saturating_mul(self.max_retries - attempt));
            }
            total = total.saturating_add(delay);
        }
        total
    }
}

/// Abstraction over sleeping between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer; does not block other tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
