//! Retry policy shared by every outbound HTTP call.
//!
//! Transient failures (429, network errors, 5xx) are retried with
//! exponential backoff. Everything else, including 4xx business errors and
//! parse failures, is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth retrying after a backoff delay.
#[must_use]
pub fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } | ScraperError::RemoteApi { status, .. } => {
            *status >= 500
        }
        _ => false,
    }
}

/// Runs `operation`, retrying transient errors up to `max_retries` extra
/// times. The wait before retry `n` (1-based) is
/// `backoff_base_secs * 2^(n-1)` seconds.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient HTTP error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ScraperError {
        ScraperError::RateLimited {
            domain: "shop.example.com".to_owned(),
            retry_after_secs: 0,
        }
    }

    fn status(code: u16) -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: code,
            url: "https://shop.example.com/products.json".to_owned(),
        }
    }

    async fn count_attempts(max_retries: u32, fail_times: u32, err: fn() -> ScraperError) -> (u32, bool) {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(max_retries, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < fail_times {
                    Err(err())
                } else {
                    Ok::<u32, ScraperError>(n)
                }
            }
        })
        .await;
        (calls.load(Ordering::SeqCst), result.is_ok())
    }

    #[tokio::test]
    async fn succeeds_on_first_try_without_retrying() {
        assert_eq!(count_attempts(3, 0, rate_limited).await, (1, true));
    }

    #[tokio::test]
    async fn retries_rate_limit_until_success() {
        assert_eq!(count_attempts(3, 2, rate_limited).await, (3, true));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        // max_retries = 2 means three attempts in total.
        assert_eq!(count_attempts(2, 10, rate_limited).await, (3, false));
    }

    #[tokio::test]
    async fn retries_server_errors() {
        assert_eq!(count_attempts(3, 1, || status(503)).await, (2, true));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        assert_eq!(count_attempts(3, 10, || status(403)).await, (1, false));
        assert_eq!(
            count_attempts(3, 10, || ScraperError::NotFound {
                url: "https://shop.example.com/x".to_owned()
            })
            .await,
            (1, false)
        );
    }

    #[test]
    fn remote_api_errors_follow_status_class() {
        assert!(is_retriable(&ScraperError::RemoteApi {
            status: 502,
            message: String::new()
        }));
        assert!(!is_retriable(&ScraperError::RemoteApi {
            status: 401,
            message: String::new()
        }));
        assert!(!is_retriable(&ScraperError::Timeout {
            run_id: "r1".to_owned(),
            waited_secs: 10
        }));
    }
}
