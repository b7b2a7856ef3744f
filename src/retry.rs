//! Bounded timeout and retry for slow external calls.
//!
//! Applied to language model invocations: each attempt gets its own deadline
//! and a failed or timed-out attempt is retried up to `max_retries` times.

use crate::error::{Result, VidqaError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Timeout and retry budget for one kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Attempts made after the first one fails.
    pub max_retries: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds or the retry budget is spent.
    ///
    /// The last error is returned when every attempt fails.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(VidqaError::Timeout {
                    operation: operation.to_string(),
                    timeout: self.timeout,
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("{} failed (attempt {}/{}): {}", operation, attempt, attempts, e);
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(1)
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, VidqaError>(42)
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_then_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(1)
            .run("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    Ok::<_, VidqaError>("done")
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_single_retry() {
        let calls = AtomicU32::new(0);
        let err = fast_policy(1)
            .run("model call", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(VidqaError::Llm("boom".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(err, VidqaError::Llm(_)));
    }

    #[tokio::test]
    async fn test_timeout_error_names_operation() {
        let err = fast_policy(0)
            .run("model call", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, VidqaError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, VidqaError::Timeout { .. }));
        assert_eq!(err.to_string(), "model call timed out after 50ms");
    }
}
