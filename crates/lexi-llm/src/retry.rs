//! Retry configuration and exponential backoff for generator calls.
//!
//! The generator owns its retries; callers see one result per request.
//! Retries only apply to errors classified retryable by
//! [`GeneratorError::is_retryable`], and a rate-limit response with an
//! explicit delay overrides the computed backoff.

use std::future::Future;

use tokio::time::{Duration, sleep};
use tracing::warn;

use crate::errors::{GeneratorError, Result};

/// Default maximum delay between retries in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Retry parameters.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum retry attempts after the first try.
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms.
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms.
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

/// Calculate exponential backoff delay with explicit randomness.
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (random*2-1) *
/// jitter_factor)` where `random` is in `[0.0, 1.0)`.
#[must_use]
pub fn backoff_delay_ms(attempt: u32, config: &RetryConfig, random: f64) -> u64 {
    let exponential = config.base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(config.max_delay_ms);
    let jitter = 1.0 + (random * 2.0 - 1.0) * config.jitter_factor;
    ((capped as f64) * jitter).round().max(0.0) as u64
}

/// Sub-second wall-clock fraction, used as the jitter source.
fn jitter_random() -> f64 {
    f64::from(chrono::Utc::now().timestamp_subsec_nanos() % 1_000_000) / 1_000_000.0
}

/// Run `op`, retrying retryable failures with exponential backoff.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= config.max_retries {
                    return Err(err);
                }
                let delay_ms = match &err {
                    GeneratorError::RateLimited { retry_after_ms } => *retry_after_ms,
                    _ => backoff_delay_ms(attempt, config, jitter_random()),
                };
                warn!(attempt, delay_ms, error = %err, "generator call failed, retrying");
                sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter_factor: 0.0,
        };
        assert_eq!(backoff_delay_ms(0, &config, 0.5), 1000);
        assert_eq!(backoff_delay_ms(1, &config, 0.5), 2000);
        assert_eq!(backoff_delay_ms(2, &config, 0.5), 4000);
        assert_eq!(backoff_delay_ms(3, &config, 0.5), 8000);
        assert_eq!(backoff_delay_ms(10, &config, 0.5), 8000);
    }

    #[test]
    fn jitter_spreads_symmetrically() {
        let config = RetryConfig {
            jitter_factor: 0.2,
            ..RetryConfig::default()
        };
        assert_eq!(backoff_delay_ms(0, &config, 0.0), 800);
        assert_eq!(backoff_delay_ms(0, &config, 0.5), 1000);
    }

    #[tokio::test]
    async fn retries_retryable_then_succeeds() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            ..RetryConfig::default()
        };
        let calls = AtomicU32::new(0);
        let result = with_retry(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(GeneratorError::Api {
                        status: 503,
                        message: "overloaded".into(),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_immediately() {
        let config = RetryConfig::default();
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&config, || {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(GeneratorError::InvalidPayload {
                    message: "not json".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
