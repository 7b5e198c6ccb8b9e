//! Timeout enforcement.
//!
//! # Responsibilities
//! - Run an operation as its own task and race it against a deadline
//! - Keep a timeout distinct from the operation's own errors
//!
//! A task that loses the race is abandoned, not aborted: it keeps running in
//! the background and its output is dropped. Operations wrapped here must be
//! safe to finish after the caller has moved on.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

/// Errors produced by [`with_timeout`] itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError {
    /// The operation did not finish before the deadline.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The operation's task panicked or was cancelled by the runtime.
    #[error("operation aborted: {0}")]
    Aborted(String),
}

/// Run `operation` on a separate task, returning its output if it completes
/// within `duration`.
pub async fn with_timeout<F>(operation: F, duration: Duration) -> Result<F::Output, TimeoutError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    // Dropping the handle on timeout detaches the task rather than killing it.
    let handle = tokio::spawn(operation);

    match timeout(duration, handle).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(join_err)) => {
            tracing::error!(error = %join_err, "Timed operation aborted");
            Err(TimeoutError::Aborted(join_err.to_string()))
        }
        Err(_) => {
            tracing::warn!(timeout = ?duration, "Operation timed out");
            Err(TimeoutError::DeadlineExceeded(duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_fast_operation_returns_its_result() {
        let ok = with_timeout(async { Ok::<_, String>(7) }, Duration::from_secs(1)).await;
        assert_eq!(ok.unwrap(), Ok(7));

        let err = with_timeout(async { Err::<u8, _>("some error".to_string()) }, Duration::from_secs(1)).await;
        assert_eq!(err.unwrap(), Err("some error".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_exceeds_deadline() {
        let result = with_timeout(
            async {
                sleep(Duration::from_secs(10)).await;
            },
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(result, Err(TimeoutError::DeadlineExceeded(Duration::from_secs(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_operation_runs_to_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(
            async move {
                sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(TimeoutError::DeadlineExceeded(_))));
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_secs(10)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_operation_is_reported() {
        let result = with_timeout(
            async {
                panic!("boom");
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(TimeoutError::Aborted(_))));
    }
}
