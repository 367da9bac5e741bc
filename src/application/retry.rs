//! Retry with exponential backoff for vector store calls.
//!
//! Only [`ErrorKind::Transient`] failures are retried. Waiting happens with
//! `tokio::time::sleep`, so a backoff suspends the calling task only.

use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::{ErrorKind, StoreError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_FACTOR: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub base_delay: Duration,
    /// Each subsequent wait is multiplied by this.
    pub backoff_factor: u32,
    /// Deadline for a single attempt. An elapsed deadline counts as transient.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Wait after the given failed attempt (1-based): `base × factor^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        self.base_delay
            .saturating_mul(self.backoff_factor.saturating_pow(exp))
    }

    /// Upper bound on time spent sleeping if every attempt fails.
    pub fn max_total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|a| self.delay_after(a))
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = match self.attempt_timeout {
                Some(deadline) => match tokio::time::timeout(deadline, op()).await {
                    Ok(res) => res,
                    Err(_) => Err(StoreError::transient(format!(
                        "attempt timed out after {deadline:?}"
                    ))),
                },
                None => op().await,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op = op_name, attempt, "store call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.kind {
                ErrorKind::Session => return Err(DomainError::Connection(err.message)),
                ErrorKind::Permanent => return Err(DomainError::Store(err.message)),
                ErrorKind::Transient if attempt >= max_attempts => {
                    warn!(
                        op = op_name,
                        attempt,
                        max_attempts,
                        error = %err.message,
                        "store call failed, giving up"
                    );
                    return Err(DomainError::RepositoryUnavailable {
                        attempts: attempt,
                        last_error: err.message,
                    });
                }
                ErrorKind::Transient => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op = op_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err.message,
                        "transient store failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
