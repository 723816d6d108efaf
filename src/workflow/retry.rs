// src/workflow/retry.rs

//! Bounded retry with linear backoff and jitter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::{DevstrapError, Result};

/// Retry parameters shared by every retried action in a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_bound: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            jitter_bound: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            jitter_bound: Duration::ZERO,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based):
    /// `base_delay * attempt + U[0, jitter_bound]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let linear = self.base_delay.saturating_mul(attempt);
        let jitter_ms = self.jitter_bound.as_millis().min(u64::MAX as u128) as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        linear.saturating_add(jitter)
    }
}

/// Invoke `action` until it succeeds or `policy.max_attempts` is used up.
///
/// `label` is the full action (usually the command line) and appears in
/// logs and in the final error. Interrupts are never retried, and
/// cancellation during a backoff sleep returns immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    cancel: &CancellationToken,
    mut action: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match action().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(action = %label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err @ DevstrapError::Interrupted { .. }) => return Err(err),
            Err(err) if attempt >= max_attempts => {
                error!(
                    action = %label,
                    attempts = attempt,
                    error = %err,
                    "giving up: action failed on its final attempt"
                );
                return Err(DevstrapError::RetriesExhausted {
                    action: label.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    action = %label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed; backing off"
                );

                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(DevstrapError::Interrupted { step: None });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}
