//! Retry-with-backoff for rate-limited generation calls.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that can say whether they were caused by rate limiting.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;

    /// Minimum wait the server asked for, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added each time the delay doubles.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn no_delay(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// `delay * 2 + random(0..=max_jitter)`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        delay.saturating_mul(2) + Duration::from_millis(jitter)
    }
}

/// Runs `operation`, retrying only rate-limited failures.
///
/// Any other error is returned after the first attempt. The operation runs at
/// most `max_retries + 1` times. A server-provided `retry_after` longer than
/// the backoff delay replaces it for that wait.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimitSignal + Display,
{
    let mut delay = policy.base_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && attempt < policy.max_retries => {
                attempt += 1;
                let wait = err.retry_after().map_or(delay, |hint| hint.max(delay));
                tracing::warn!(
                    "Rate limited ({}), retry {}/{} in {:?}",
                    err,
                    attempt,
                    policy.max_retries,
                    wait
                );
                tokio::time::sleep(wait).await;
                delay = policy.next_delay(delay);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> GenerationError {
        GenerationError::request(Some(429), "Too Many Requests")
    }

    #[tokio::test]
    async fn test_succeeds_after_two_rate_limits() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&RetryPolicy::no_delay(2), move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(rate_limited()) } else { Ok("image") }
        })
        .await;

        assert_eq!(result, Ok("image"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&RetryPolicy::no_delay(5), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::SafetyBlocked {
                reason: "blocked".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(GenerationError::SafetyBlocked { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&RetryPolicy::no_delay(2), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(rate_limited())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_base_delay_then_grows() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::ZERO,
        };
        let started = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let _: Result<(), _> = with_retry(&policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(rate_limited())
        })
        .await;

        // 2000ms before the first retry, 4000ms before the second.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(6000));
        assert!(elapsed < Duration::from_millis(6100));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_retry_after_is_a_floor() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::ZERO,
        };
        let started = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = with_retry(&policy, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            match n {
                // Longer than the 2000ms backoff: honored.
                0 => Err(GenerationError::RateLimited {
                    status: Some(429),
                    message: "slow down".into(),
                    retry_after: Some(Duration::from_secs(30)),
                }),
                // Shorter than the 4000ms backoff: ignored.
                1 => Err(GenerationError::RateLimited {
                    status: Some(429),
                    message: "slow down".into(),
                    retry_after: Some(Duration::from_secs(1)),
                }),
                _ => Ok("image"),
            }
        })
        .await;

        assert_eq!(result, Ok("image"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(34_000));
        assert!(elapsed < Duration::from_millis(34_100));
    }

    #[test]
    fn test_next_delay_jitter_bounds() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::from_millis(1000),
        };
        for _ in 0..50 {
            let next = policy.next_delay(Duration::from_millis(100));
            assert!(next >= Duration::from_millis(200));
            assert!(next <= Duration::from_millis(1200));
        }
    }
}
