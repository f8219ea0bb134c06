//! Retry with exponential backoff
//!
//! Wraps a single async operation in a bounded retry loop. The policy is a
//! small state machine kept apart from the operation so it can be tested on
//! its own:
//!
//! ```text
//! Attempting(n) --ok--------------------------------> Succeeded
//! Attempting(n) --err, n+1 == max attempts----------> Exhausted
//! Attempting(n) --err, not retryable----------------> FailedNonRetryable
//! Attempting(n) --err, retryable--> Backoff(n+1, d) --sleep d--> Attempting(n+1)
//! ```
//!
//! **Backoff:** before attempt `n > 0` the driver sleeps
//! `base_delay * 2^n + random(0..=max_jitter)`. With the defaults that is
//! 2-3 s before the second attempt and 4-5 s before the third.
//!
//! The error handed back is always the last one the operation produced.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use choir_common::config::CompiledDefaults;
use choir_common::Retryable;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// When false the operation is attempted exactly once
    pub retry: bool,
    /// Total attempt budget (not additional retries)
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry: true,
            max_retries: CompiledDefaults::MAX_RETRIES,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

/// Where the retry loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// About to run attempt `attempt` (0-based)
    Attempting { attempt: u32 },
    /// Waiting `delay` before attempt `attempt`
    Backoff { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    /// Attempt budget used up; last error is returned
    Exhausted { attempts: u32 },
    /// Error classified as permanent; returned without further attempts
    FailedNonRetryable { attempts: u32 },
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            retry: false,
            ..Self::default()
        }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Attempts the driver will make at most
    pub fn max_attempts(&self) -> u32 {
        if self.retry {
            self.max_retries.max(1)
        } else {
            1
        }
    }

    /// Sleep before attempt `attempt` (0-based, only meaningful for `attempt > 0`)
    pub fn backoff_delay(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).saturating_add(jitter)
    }

    /// Next state after `attempts_made` attempts, the last of which failed.
    ///
    /// The attempt budget is checked before classification, so an exhausted
    /// loop reports `Exhausted` even for a permanent error.
    pub fn after_failure(&self, attempts_made: u32, retryable: bool, jitter: Duration) -> RetryState {
        if attempts_made >= self.max_attempts() {
            RetryState::Exhausted {
                attempts: attempts_made,
            }
        } else if !retryable {
            RetryState::FailedNonRetryable {
                attempts: attempts_made,
            }
        } else {
            RetryState::Backoff {
                attempt: attempts_made,
                delay: self.backoff_delay(attempts_made, jitter),
            }
        }
    }
}

fn random_jitter(max_jitter: Duration) -> Duration {
    let max_ms = max_jitter.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Run `operation` under `policy`, retrying transient failures.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "read Members!A:B")
/// * `policy` - Attempt budget and backoff timing
/// * `operation` - Closure producing a fresh attempt future on each call
pub async fn do_async_operation_with_retry<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut state = RetryState::Attempting { attempt: 0 };

    loop {
        match state {
            RetryState::Attempting { attempt } => match operation().await {
                Ok(value) => {
                    state = RetryState::Succeeded {
                        attempts: attempt + 1,
                    };
                    if attempt > 0 {
                        tracing::debug!(
                            operation = operation_name,
                            ?state,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    state = policy.after_failure(
                        attempt + 1,
                        err.is_retryable(),
                        random_jitter(policy.max_jitter),
                    );
                    match state {
                        RetryState::Exhausted { attempts } => {
                            if policy.retry && attempts > 1 {
                                tracing::error!(
                                    operation = operation_name,
                                    attempts,
                                    error = %err,
                                    "Operation failed: retries exhausted"
                                );
                            }
                            return Err(err);
                        }
                        RetryState::FailedNonRetryable { attempts } => {
                            tracing::debug!(
                                operation = operation_name,
                                attempts,
                                error = %err,
                                "Operation failed with non-retryable error"
                            );
                            return Err(err);
                        }
                        RetryState::Backoff { attempt, delay } => {
                            tracing::warn!(
                                operation = operation_name,
                                attempt,
                                backoff_ms = delay.as_millis() as u64,
                                error = %err,
                                "Transient failure, will retry after backoff"
                            );
                        }
                        RetryState::Attempting { .. } | RetryState::Succeeded { .. } => {
                            unreachable!("after_failure never yields {:?}", state)
                        }
                    }
                }
            },
            RetryState::Backoff { attempt, delay } => {
                tokio::time::sleep(delay).await;
                state = RetryState::Attempting { attempt };
            }
            RetryState::Succeeded { .. }
            | RetryState::Exhausted { .. }
            | RetryState::FailedNonRetryable { .. } => {
                unreachable!("terminal retry states return from the loop")
            }
        }
    }
}
