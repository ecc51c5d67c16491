//! Retry executor for rate-limited requests
//!
//! This module re-runs a request when the backend answers HTTP 429, waiting
//! an exponentially growing delay between attempts. Every other failure is
//! returned to the caller unchanged on the first attempt.

use crate::config::RetryConfig;
use crate::error::RetryableError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry executor with exponential backoff, bounded by attempt count
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new RetryExecutor with the given configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a RetryExecutor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Execute an async request with retry on rate limiting
    ///
    /// The request is attempted once, then up to `max_retries` more times while
    /// it keeps failing with a retryable error. The wait before retry `k`
    /// (1-indexed) is `delay_ms * backoff_factor^(k-1)`. There is no jitter and
    /// no cap on the total time spent waiting.
    ///
    /// # Returns
    ///
    /// The first successful result, or the last error unchanged
    pub async fn execute<F, Fut, T, E>(&self, request: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match request().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    if attempt > self.config.max_retries {
                        warn!(
                            attempts = attempt,
                            max_retries = self.config.max_retries,
                            error = %err,
                            "Rate limit retries exhausted"
                        );
                        return Err(err);
                    }

                    let delay = self.backoff_for(attempt);
                    debug!(
                        attempt = attempt,
                        retries_left = self.config.max_retries + 1 - attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Rate limited, retrying after backoff"
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Wait before retry `retry` (1-indexed), rounded to whole milliseconds
    ///
    /// Returns `Duration::ZERO` for `retry == 0`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let millis =
            self.config.delay_ms as f64 * self.config.backoff_factor.powi(retry as i32 - 1);
        Duration::from_millis(millis.round() as u64)
    }

    /// Get the retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn rate_limited() -> ApiError {
        ApiError::Http {
            status: 429,
            message: None,
        }
    }

    fn executor(max_retries: u32, delay_ms: u64, backoff_factor: f64) -> RetryExecutor {
        RetryExecutor::new(RetryConfig {
            max_retries,
            delay_ms,
            backoff_factor,
        })
    }

    // Test 1: Success on first attempt returns immediately
    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let retry = executor(3, 100, 2.0);
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result: Result<&str, ApiError> = retry
            .execute(|| {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok("listed")
                }
            })
            .await;

        assert_eq!(result, Ok("listed"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    // Test 2: Always-429 request runs max_retries + 1 times
    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_attempt_count() {
        for max_retries in 0..=4 {
            let retry = executor(max_retries, 10, 2.0);
            let call_count = Arc::new(AtomicU32::new(0));
            let call_count_clone = call_count.clone();

            let result: Result<(), ApiError> = retry
                .execute(|| {
                    let count = call_count_clone.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Err(rate_limited())
                    }
                })
                .await;

            // The final 429 propagates unchanged
            assert_eq!(result, Err(rate_limited()));
            assert_eq!(call_count.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    // Test 3: 500 is not retried and propagates unchanged
    #[tokio::test(start_paused = true)]
    async fn test_server_error_not_retried() {
        let retry = executor(5, 10, 2.0);
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let server_error = ApiError::Http {
            status: 500,
            message: Some("boom".to_string()),
        };
        let expected = server_error.clone();

        let result: Result<(), ApiError> = retry
            .execute(|| {
                let count = call_count_clone.clone();
                let err = server_error.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(err)
                }
            })
            .await;

        assert_eq!(result, Err(expected));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    // Test 4: Transport errors are not retried
    #[tokio::test(start_paused = true)]
    async fn test_timeout_not_retried() {
        let retry = executor(3, 10, 2.0);
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result: Result<(), ApiError> = retry
            .execute(|| {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Timeout)
                }
            })
            .await;

        assert_eq!(result, Err(ApiError::Timeout));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    // Test 5: Recovers after transient rate limiting
    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_rate_limit() {
        let retry = executor(3, 10, 2.0);
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result: Result<&str, ApiError> = retry
            .execute(|| {
                let count = call_count_clone.clone();
                async move {
                    if count.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(rate_limited())
                    } else {
                        Ok("listed")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("listed"));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    // Test 6: Waits follow delay * factor^(k-1)
    #[tokio::test(start_paused = true)]
    async fn test_backoff_schedule() {
        let retry = executor(3, 100, 2.0);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();

        let _: Result<(), ApiError> = retry
            .execute(|| {
                let calls = calls_clone.clone();
                async move {
                    calls.lock().unwrap().push(Instant::now());
                    Err(rate_limited())
                }
            })
            .await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let waits: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    // Test 7: Factor 1 gives constant delays
    #[tokio::test(start_paused = true)]
    async fn test_constant_backoff() {
        let retry = executor(2, 250, 1.0);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();

        let _: Result<(), ApiError> = retry
            .execute(|| {
                let calls = calls_clone.clone();
                async move {
                    calls.lock().unwrap().push(Instant::now());
                    Err(rate_limited())
                }
            })
            .await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls[1] - calls[0], Duration::from_millis(250));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(250));
    }

    // Test 8: backoff_for matches the schedule
    #[test]
    fn test_backoff_for() {
        let retry = executor(5, 1000, 2.0);

        assert_eq!(retry.backoff_for(0), Duration::ZERO);
        assert_eq!(retry.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(retry.backoff_for(2), Duration::from_millis(2000));
        assert_eq!(retry.backoff_for(3), Duration::from_millis(4000));
    }

    // Test 9: Default configuration
    #[test]
    fn test_default_configuration() {
        let retry = RetryExecutor::with_defaults();
        let config = retry.config();

        assert_eq!(config.max_retries, 3);
        assert_eq!(config.delay_ms, 1000);
        assert!((config.backoff_factor - 2.0).abs() < f64::EPSILON);
    }
}
