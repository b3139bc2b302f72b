//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race a single attempt against its deadline
//! - Cancel the attempt's future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - An expired attempt counts as a failure for retry and breaker purposes

use std::future::Future;
use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::error::ResilienceError;

/// Await `attempt`, failing with [`ResilienceError::Timeout`] once
/// `deadline` elapses. `None` waits indefinitely.
pub async fn with_deadline<T, E, Fut>(
    deadline: Option<Duration>,
    context: &str,
    attempt: Fut,
) -> Result<T, ResilienceError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    let Some(after) = deadline else {
        return attempt.await.map_err(ResilienceError::Operation);
    };

    match tokio::time::timeout(after, attempt).await {
        Ok(result) => result.map_err(ResilienceError::Operation),
        Err(_) => {
            tracing::warn!(context, timeout_ms = after.as_millis() as u64, "Attempt timed out");
            metrics::record_attempt_timeout(context);
            Err(ResilienceError::Timeout {
                context: context.to_string(),
                after,
            })
        }
    }
}
