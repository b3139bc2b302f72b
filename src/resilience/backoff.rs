//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Capped exponential delay before the retry following `attempt_index`.
///
/// `attempt_index` is 0 for the first retry, so the sequence is
/// `base, 2 * base, 4 * base, ...` up to `max_ms`.
pub fn exponential_delay(attempt_index: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 2u64.saturating_pow(attempt_index);
    let delay_ms = base_ms.saturating_mul(factor);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Calculate exponential backoff delay with jitter.
///
/// The jitter is a random extra in `0..=jitter_ratio * delay`.
pub fn calculate_backoff(attempt_index: u32, base_ms: u64, max_ms: u64, jitter_ratio: f64) -> Duration {
    let capped = exponential_delay(attempt_index, base_ms, max_ms);

    let jitter_range = (capped.as_millis() as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(jitter)
}
