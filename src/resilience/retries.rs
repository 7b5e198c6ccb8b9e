//! Bounded retry with exponential backoff.
//!
//! # Responsibilities
//! - Re-invoke a fallible async operation up to a fixed attempt count
//! - Sleep `base * 2^n` after the n-th failure before the next attempt
//! - Stop early when the caller's predicate marks an error as permanent
//!
//! Only wrap operations that are safe to repeat. The final failed attempt is
//! not followed by a sleep.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Outcome of a retried operation that never succeeded.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Zero attempts were allowed, so the operation never ran.
    #[error("retry limit is zero; operation was not attempted")]
    NoAttempts,

    /// Every permitted attempt failed, or a permanent error stopped retrying.
    #[error("operation failed after {attempts} attempt(s): {last}")]
    Failed { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// The last error the operation returned, if it ran at all.
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::NoAttempts => None,
            RetryError::Failed { last, .. } => Some(last),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NoAttempts => 0,
            RetryError::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Attempt budget and backoff shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Uncapped exponential policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::MAX,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay after the given failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay)
    }

    /// Retry every error.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_if(op, |_| true).await
    }

    /// Retry only errors for which `should_retry` returns true.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        mut op: F,
        mut should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
        E: fmt::Display,
    {
        if self.max_attempts == 0 {
            return Err(RetryError::NoAttempts);
        }

        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt >= self.max_attempts || !should_retry(&err) {
                        return Err(RetryError::Failed {
                            attempts: attempt,
                            last: err,
                        });
                    }

                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
            .with_max_delay(Duration::from_millis(config.max_delay_ms))
    }
}

/// Invoke `op` up to `max_attempts` times with uncapped exponential backoff.
pub async fn retry<T, E, F, Fut>(
    op: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    RetryPolicy::new(max_attempts, base_delay).run(op).await
}

/// Like [`retry`], but permanent errors (predicate returns false) stop at once.
pub async fn retry_if<T, E, F, Fut, P>(
    op: F,
    max_attempts: u32,
    base_delay: Duration,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: fmt::Display,
{
    RetryPolicy::new(max_attempts, base_delay)
        .run_if(op, should_retry)
        .await
}
