//! Rate-limited, retrying wrapper around every outbound call.
//!
//! A [`Gateway`] is shared (behind an `Arc`) by all modules. Each *attempt*
//! takes one token from the process-wide [`TokenBucket`], so retries are rate
//! limited like first attempts. Transient failures are retried with
//! exponential backoff; terminal failures and exhausted retries return the
//! last error to the caller.

mod limiter;
mod retry;

pub use limiter::{RateLimitConfig, TokenBucket};
pub use retry::{RetryClassifier, RetryPolicy, DEFAULT_RETRYABLE_STATUSES};

use std::future::Future;
use std::time::Duration;

use crate::error::NetworkError;

#[derive(Debug)]
pub struct Gateway {
    limiter: TokenBucket,
    policy: RetryPolicy,
    classifier: RetryClassifier,
    timeout: Option<Duration>,
}

impl Gateway {
    pub fn new(rate_limit: RateLimitConfig, policy: RetryPolicy) -> Self {
        Self {
            limiter: TokenBucket::new(rate_limit),
            policy,
            classifier: RetryClassifier::default(),
            timeout: None,
        }
    }

    /// Bound each attempt; an attempt that overruns becomes a transient
    /// [`NetworkError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the default status classification.
    pub fn with_classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `call` under admission control and the default classifier.
    ///
    /// `operation` names the call in logs.
    pub async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, NetworkError>>,
    {
        self.execute_with(operation, &self.classifier, call).await
    }

    /// Run `call` with a caller-supplied classification of retryable failures.
    pub async fn execute_with<T, F, Fut>(
        &self,
        operation: &str,
        classifier: &RetryClassifier,
        mut call: F,
    ) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, NetworkError>>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let outcome = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, call()).await {
                    Ok(result) => result,
                    Err(_) => Err(NetworkError::Timeout {
                        operation: operation.to_string(),
                        duration_ms: limit.as_millis() as u64,
                    }),
                },
                None => call().await,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !classifier.is_transient(&err) {
                tracing::debug!(
                    operation,
                    code = err.error_code(),
                    error = %err,
                    "terminal failure, not retrying"
                );
                return Err(err);
            }
            if attempt >= max_attempts {
                tracing::error!(
                    operation,
                    attempts = attempt,
                    code = err.error_code(),
                    error = %err,
                    "retries exhausted"
                );
                return Err(err);
            }

            let mut delay = self.policy.delay_for(attempt);
            if let NetworkError::RateLimited {
                retry_after_secs: Some(secs),
            } = &err
            {
                // The hint is capped like any other backoff.
                delay = delay.max(Duration::from_secs(*secs).min(self.policy.max_delay));
            }
            tracing::warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                code = err.error_code(),
                error = %err,
                "transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn gateway() -> Gateway {
        Gateway::new(
            RateLimitConfig::default(),
            RetryPolicy::default().with_jitter(false),
        )
    }

    fn unavailable() -> NetworkError {
        NetworkError::from_status(503, "unavailable", None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_transient_failures() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));

        let result = gateway
            .execute("list", || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n <= 2 {
                        Err(unavailable())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_after_exhausting_attempts() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = gateway
            .execute("list", || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(NetworkError::from_status(503, format!("attempt {}", n), None))
                }
            })
            .await;

        assert_eq!(result, Err(NetworkError::from_status(503, "attempt 3", None)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_is_not_retried() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = gateway
            .execute("get", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(NetworkError::from_status(404, "missing", None))
                }
            })
            .await;

        assert!(matches!(result, Err(NetworkError::HttpStatus { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_between_attempts() {
        let gateway = gateway();
        let started = Instant::now();

        let _: Result<(), _> = gateway.execute("list", || async { Err(unavailable()) }).await;

        // 500ms + 1000ms of backoff before the second and third attempts.
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(started.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_consumes_a_token() {
        let gateway = Gateway::new(
            RateLimitConfig {
                capacity: 10,
                refill_per_sec: 0.001,
            },
            RetryPolicy::default()
                .with_jitter(false)
                .with_base_delay(Duration::from_millis(1)),
        );

        let _: Result<(), _> = gateway.execute("list", || async { Err(unavailable()) }).await;

        assert_eq!(gateway.limiter().available(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_raises_delay() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result = gateway
            .execute("list", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(NetworkError::RateLimited {
                            retry_after_secs: Some(5),
                        })
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_is_capped_at_max_delay() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result = gateway
            .execute("list", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(NetworkError::RateLimited {
                            retry_after_secs: Some(31_536_000),
                        })
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        let elapsed = started.elapsed();
        assert!(elapsed >= gateway.policy().max_delay);
        assert!(elapsed < gateway.policy().max_delay + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out_and_is_retried() {
        let gateway = gateway().with_timeout(Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let result = gateway
            .execute("list", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    Ok::<_, NetworkError>("fast")
                }
            })
            .await;

        assert_eq!(result, Ok("fast"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_classifier_controls_retry() {
        let gateway = gateway();
        let calls = Arc::new(AtomicU32::new(0));
        let classifier = RetryClassifier::with_statuses([409]);

        let result: Result<(), _> = gateway
            .execute_with("update", &classifier, || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(NetworkError::from_status(409, "conflict", None))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
