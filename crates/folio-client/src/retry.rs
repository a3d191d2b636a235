//! Bounded exponential-backoff retry

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::error::{classify, ClientError, Result};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Decides whether a failed attempt is worth repeating
pub type ShouldRetry = fn(&ClientError) -> bool;

/// Retry on network failures, timeouts, 429 and 5xx; never on other 4xx.
pub fn default_should_retry(error: &ClientError) -> bool {
    classify(error).is_retryable()
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts is `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    /// Upper bound of the random amount added to each delay
    pub jitter: Duration,
    /// Cap on any single delay
    pub max_delay: Option<Duration>,
    pub should_retry: ShouldRetry,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            jitter: Duration::ZERO,
            max_delay: None,
            should_retry: default_should_retry,
        }
    }
}

impl RetryConfig {
    /// A config that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the attempt following failed attempt `attempt` (0-based):
    /// `base_delay * backoff_factor^attempt`, capped by `max_delay`, without jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(0.0).powi(attempt as i32);
        let delay = Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Wraps a remote call with bounded exponential-backoff retry.
///
/// Callers must only hand it idempotent or server-deduplicated operations:
/// a write that failed on a false-negative network error will be repeated.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `call` until it succeeds, a non-retryable error occurs, or the
    /// retry budget is spent. The last error observed is returned.
    ///
    /// Dropping the returned future cancels any in-flight attempt or backoff.
    pub async fn execute<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.config.max_retries || !(self.config.should_retry)(&err) {
                        return Err(err);
                    }

                    let delay = jittered(self.config.delay_for(attempt), self.config.jitter);
                    warn!(
                        error = %err,
                        attempt = attempt + 1,
                        max_attempts = self.config.max_retries + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn jittered(delay: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return delay;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .subsec_nanos() as u64;
    delay.saturating_add(Duration::from_millis(nanos % jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn unavailable() -> ClientError {
        ClientError::Status {
            status: 503,
            message: None,
            code: None,
        }
    }

    #[test]
    fn test_delay_schedule() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(500));
        assert_eq!(config.delay_for(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_cap() {
        let config = RetryConfig {
            max_delay: Some(Duration::from_millis(1500)),
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for(2), Duration::from_millis(1500));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let base = Duration::from_millis(100);
        let delay = jittered(base, Duration::from_millis(50));
        assert!(delay >= base && delay < Duration::from_millis(150));
        assert_eq!(jittered(base, Duration::ZERO), base);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_and_attempt_count() {
        let policy = RetryPolicy::default();
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let result: Result<()> = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.lock().unwrap().push(Instant::now());
                    Err(unavailable())
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(503));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_on_bad_request() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<()> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::Status {
                        status: 400,
                        message: Some("Please enter all fields".into()),
                        code: None,
                    })
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(400));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(Instant::now() - started, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_call_succeeds_on_third_attempt() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ClientError::Network("connection reset".into()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_error_is_surfaced() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        });
        let attempts = AtomicU32::new(0);

        let result: Result<()> = policy
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ClientError::Timeout)
                    } else {
                        Err(unavailable())
                    }
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().status(), Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_classifier_overrides_default() {
        fn never(_: &ClientError) -> bool {
            false
        }
        let policy = RetryPolicy::new(RetryConfig {
            should_retry: never,
            ..RetryConfig::default()
        });
        let attempts = AtomicU32::new(0);

        let _: Result<()> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_config_makes_one_attempt() {
        let policy = RetryPolicy::new(RetryConfig::no_retry());
        let attempts = AtomicU32::new(0);

        let _: Result<()> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::Network("refused".into())) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
