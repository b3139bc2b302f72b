//! Retry logic.
//!
//! # Responsibilities
//! - Attempt an operation up to `max_attempts` times
//! - Sleep with exponential backoff + jitter between attempts
//! - Re-raise the last failure unchanged once attempts run out
//!
//! # Design Decisions
//! - Every failure is retryable; callers decide what they wrap
//! - Independent of circuit breakers; composition happens in `services`
//! - The sleep between attempts is the only suspension point added here

use std::fmt::Display;
use std::future::Future;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Run `operation` until it succeeds or `config.max_attempts` attempts fail.
///
/// `context` tags the retry log entries (e.g. `"payment.charge"`).
pub async fn with_retry<T, E, F, Fut>(mut operation: F, config: &RetryConfig, context: &str) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(context, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if attempt < max_attempts => {
                let delay = calculate_backoff(
                    attempt - 1,
                    config.base_delay_ms,
                    config.max_delay_ms,
                    config.jitter_ratio,
                );
                tracing::warn!(
                    context,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Operation failed, retrying"
                );
                metrics::record_retry(context);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if max_attempts > 1 {
                    tracing::error!(context, attempts = attempt, error = %error, "Retries exhausted");
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(3, 10, 100);

        let result: Result<&str, String> = with_retry(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("temporary".to_string())
                } else {
                    Ok("done")
                }
            },
            &config,
            "test.transient",
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reraises_last_error() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(3, 1000, 10_000);
        let started = Instant::now();

        let result: Result<(), String> = with_retry(
            || async { Err(format!("failure #{}", calls.fetch_add(1, Ordering::SeqCst) + 1)) },
            &config,
            "test.exhausted",
        )
        .await;

        assert_eq!(result.unwrap_err(), "failure #3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000) && elapsed < Duration::from_millis(3010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(0, 10, 100);

        let result: Result<(), &str> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            },
            &config,
            "test.zero",
        )
        .await;

        assert_eq!(result.unwrap_err(), "nope");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped() {
        let config = RetryConfig::new(4, 1000, 1500);
        let started = Instant::now();

        let _: Result<(), &str> = with_retry(|| async { Err("down") }, &config, "test.capped").await;

        // 1000 + 1500 + 1500
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(4000) && elapsed < Duration::from_millis(4010));
    }
}
