//! Backoff for Sheets API calls.
//!
//! Sheets enforces per-minute read and write quotas, so a 429 is the usual
//! retryable failure and its Retry-After is used as the wait. Other
//! retryable errors back off exponentially with equal jitter.

use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info_span, warn, Instrument};

use crate::error::SheetsResult;
use crate::metrics::record_retry;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per call, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

impl RetryConfig {
    /// `SHEETS_MAX_RETRIES` counts retries after the first attempt.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_parse::<u32>("SHEETS_MAX_RETRIES")
                .map(|retries| retries.saturating_add(1))
                .unwrap_or(defaults.max_attempts),
            base_delay: env_parse("SHEETS_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: env_parse("SHEETS_RETRY_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }

    /// Wait before retry number `retry`, counting from zero.
    fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait;
        }
        let ceiling = self
            .base_delay
            .saturating_mul(1u32.checked_shl(retry).unwrap_or(u32::MAX))
            .min(self.max_delay);
        let half = ceiling / 2;
        (half + half.mul_f64(clock_fraction())).max(self.base_delay)
    }
}

/// A value in `[0, 1)` taken from the clock's sub-second part.
fn clock_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1024) / 1024.0
}

/// Call `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is reached. The last error is returned.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> SheetsResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = SheetsResult<T>>,
{
    let mut attempt = 1;
    loop {
        let span = info_span!("sheets_request", operation = %operation, attempt);
        let err = match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= config.max_attempts {
            return Err(err);
        }

        let delay = config.backoff(attempt - 1, err.retry_after_ms().map(Duration::from_millis));
        warn!(
            operation = %operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Sheets request failed, retrying"
        );
        record_retry(operation);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::SheetsError;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_quota_wait_comes_from_retry_after() {
        let wait = RetryConfig::default().backoff(0, Some(Duration::from_secs(30)));
        assert_eq!(wait, Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_stays_between_base_and_cap() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        };
        for retry in [0, 1, 5, 40] {
            let wait = config.backoff(retry, None);
            assert!(wait >= config.base_delay, "retry {retry}: {wait:?}");
            assert!(wait <= config.max_delay, "retry {retry}: {wait:?}");
        }
        // The fixed half of the ceiling is always waited.
        assert!(config.backoff(40, None) >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), "get_values", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(SheetsError::from_http_status(503, "unavailable"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let result: SheetsResult<()> = with_retry(&fast(), "get_values", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SheetsError::from_http_status(400, "bad range"))
        })
        .await;

        assert!(matches!(result, Err(SheetsError::RequestFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_attempts_run_out() {
        let calls = AtomicU32::new(0);
        let result: SheetsResult<()> = with_retry(&fast(), "batch_update_values", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SheetsError::ServerError(500, "boom".into()))
        })
        .await;

        assert!(matches!(result, Err(SheetsError::ServerError(500, _))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
