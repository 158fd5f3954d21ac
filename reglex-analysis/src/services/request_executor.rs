//! Bounded retry with exponential backoff for remote operations
//!
//! **Algorithm:**
//! 1. Consult the health check before each attempt. Unavailable on the first
//!    attempt fails fast without consuming a retry; on later attempts it counts
//!    as a failed attempt.
//! 2. Run the operation; return on success (logging recovery if attempt > 1).
//! 3. Non-retryable failures return immediately.
//! 4. On the last allowed attempt, give up with the last error.
//! 5. Otherwise sleep `base_delay × multiplier^(attempt-1)` and retry.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::services::{HealthCheck, TransportError};

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(300);

/// Backoff parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based), capped at
    /// [`MAX_BACKOFF_DELAY`]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_BACKOFF_DELAY))
            .unwrap_or(MAX_BACKOFF_DELAY)
    }
}

/// How a retried operation ultimately failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// Health check failed before the first attempt; nothing was sent
    #[error("{context}: remote service unreachable")]
    Unreachable { context: String },

    /// Every allowed attempt failed with a retryable error
    #[error("{context} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        context: String,
        attempts: u32,
        last_error: TransportError,
    },

    /// The remote side refused the request or sent an unusable response
    #[error("{context} rejected: {error}")]
    Rejected {
        context: String,
        error: TransportError,
    },
}

impl ExecutorError {
    /// Connectivity failures are recovered by the fallback path
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ExecutorError::Unreachable { .. } | ExecutorError::Exhausted { .. }
        )
    }
}

/// Runs remote operations under a [`RetryPolicy`], gated by a [`HealthCheck`]
#[derive(Clone)]
pub struct RequestExecutor {
    health: Arc<dyn HealthCheck>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(health: Arc<dyn HealthCheck>, policy: RetryPolicy) -> Self {
        Self { health, policy }
    }

    /// Execute `operation` with the policy's attempt budget
    pub async fn run<F, Fut, T>(&self, context: &str, operation: F) -> Result<T, ExecutorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.execute(context, self.policy.max_attempts, operation)
            .await
    }

    /// Execute `operation` with at most `max_attempts` attempts
    pub async fn execute<F, Fut, T>(
        &self,
        context: &str,
        max_attempts: u32,
        mut operation: F,
    ) -> Result<T, ExecutorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = max_attempts.max(1);
        let start_time = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let outcome = if self.health.is_available().await {
                operation().await
            } else if attempt == 1 {
                tracing::warn!(
                    operation = context,
                    "Remote service unavailable, failing fast"
                );
                return Err(ExecutorError::Unreachable {
                    context: context.to_string(),
                });
            } else {
                Err(TransportError::Unavailable)
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = context,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => {
                    tracing::warn!(
                        operation = context,
                        attempt,
                        error = %error,
                        "Request failed with non-retryable error"
                    );
                    return Err(ExecutorError::Rejected {
                        context: context.to_string(),
                        error,
                    });
                }
                Err(error) => {
                    if attempt >= max_attempts {
                        tracing::error!(
                            operation = context,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            error = %error,
                            "Request failed: retries exhausted"
                        );
                        return Err(ExecutorError::Exhausted {
                            context: context.to_string(),
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        operation = context,
                        attempt,
                        max_attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %error,
                        "Request failed, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
