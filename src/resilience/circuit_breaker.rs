//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a single probe tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: reset_timeout elapsed since the last failure
//! Half-Open → Closed: success_count >= success_threshold
//! Half-Open → Open: any probe failure
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared through the registry
//! - Fail fast in Open state (operation never invoked)
//! - Single probe in Half-Open; concurrent callers are rejected while it runs
//! - State updates are serialized by a mutex that is never held across an await
//! - State lives in process memory only; a restart starts Closed

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::error::CircuitOpenError;

/// Circuit breaker states.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::HalfOpen => "HALF_OPEN",
            CircuitState::Open => "OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a breaker, for health and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub last_failure_time: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
    probe_in_flight: bool,
    /// Bumped on every probe admission and on reset; a guard only releases
    /// the slot it was issued.
    probe_generation: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            probe_in_flight: false,
            probe_generation: 0,
        }
    }

    fn take_probe(&mut self) -> u64 {
        self.probe_in_flight = true;
        self.probe_generation = self.probe_generation.wrapping_add(1);
        self.probe_generation
    }
}

/// Holds the half-open probe slot; releases it on drop, including when the
/// caller's future is cancelled mid-probe.
struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.breaker.lock();
        if inner.probe_generation == self.generation {
            inner.probe_in_flight = false;
        }
    }
}

/// A per-dependency circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker guarding the named dependency.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    /// Name of the guarded dependency.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state without triggering any transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Immutable snapshot of state and counters.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            last_failure_time: inner.last_failure_time,
        }
    }

    /// Run `operation` through the breaker.
    ///
    /// Open circuits reject with [`CircuitOpenError`] (converted into `E`)
    /// without invoking the operation. Otherwise the outcome updates the
    /// counters and is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CircuitOpenError>,
    {
        let probe = self.admit()?;
        let result = operation().await;

        match &result {
            Ok(_) => self.on_success(),
            Err(_) => self.on_failure(),
        }
        drop(probe);

        result
    }

    /// Force the breaker closed and clear its counters.
    pub fn reset(&self) {
        let mut inner = self.lock();
        tracing::info!(dependency = %self.name, from = %inner.state, "Circuit breaker manually reset");
        self.transition(&mut inner, CircuitState::Closed);
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.last_failure_time = None;
        // Half-open calls admitted before the reset no longer own the slot.
        inner.probe_in_flight = false;
        inner.probe_generation = inner.probe_generation.wrapping_add(1);
    }

    /// Decide whether a call may proceed. Half-open admissions carry the
    /// probe slot.
    fn admit(&self) -> Result<Option<ProbeGuard<'_>>, CircuitOpenError> {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => Ok(None),
            CircuitState::Open => {
                let cooled_down = inner.last_failure_time.map_or(true, |at| {
                    Instant::now().saturating_duration_since(at) > self.config.reset_timeout()
                });
                if !cooled_down {
                    return Err(self.reject());
                }

                self.transition(&mut inner, CircuitState::HalfOpen);
                inner.success_count = 0;
                let generation = inner.take_probe();
                Ok(Some(ProbeGuard { breaker: self, generation }))
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    return Err(self.reject());
                }
                let generation = inner.take_probe();
                Ok(Some(ProbeGuard { breaker: self, generation }))
            }
        }
    }

    fn reject(&self) -> CircuitOpenError {
        tracing::debug!(dependency = %self.name, "Circuit open, rejecting call");
        metrics::record_rejection(&self.name);
        CircuitOpenError {
            dependency: self.name.clone(),
        }
    }

    fn on_success(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.config.success_threshold {
                self.transition(&mut inner, CircuitState::Closed);
                inner.success_count = 0;
            }
        }
    }

    fn on_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;
        inner.last_failure_time = Some(Instant::now());

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.failure_count >= self.config.failure_threshold,
            CircuitState::Open => false,
        };

        if should_open {
            self.transition(&mut inner, CircuitState::Open);
            inner.success_count = 0;
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;

        match to {
            CircuitState::Open => tracing::warn!(
                dependency = %self.name,
                from = %from,
                failure_count = inner.failure_count,
                "Circuit breaker opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                dependency = %self.name,
                "Circuit breaker half-open, probing dependency"
            ),
            CircuitState::Closed => tracing::info!(
                dependency = %self.name,
                from = %from,
                "Circuit breaker closed"
            ),
        }
        metrics::record_transition(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::error::ResilienceError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type TestResult = Result<&'static str, ResilienceError<&'static str>>;

    fn breaker(failure_threshold: u32, reset_timeout_ms: u64, success_threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new(failure_threshold, reset_timeout_ms, success_threshold),
        )
    }

    async fn fail(cb: &CircuitBreaker) -> TestResult {
        cb.execute(|| async { Err(ResilienceError::Operation("boom")) }).await
    }

    async fn succeed(cb: &CircuitBreaker) -> TestResult {
        cb.execute(|| async { Ok("ok") }).await
    }

    #[tokio::test]
    async fn test_initial_state() {
        let cb = breaker(3, 1000, 1);
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.success_count, 0);
        assert!(snapshot.last_failure_time.is_none());
        assert_eq!(cb.name(), "test");
    }

    #[tokio::test]
    async fn test_failure_is_reraised_unchanged() {
        let cb = breaker(3, 1000, 1);
        let err = fail(&cb).await.unwrap_err();
        assert_eq!(err.into_operation(), Some("boom"));
        assert_eq!(cb.snapshot().failure_count, 1);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let cb = breaker(3, 1000, 1);
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        assert_eq!(cb.snapshot().failure_count, 2);

        assert_eq!(succeed(&cb).await.unwrap(), "ok");
        assert_eq!(cb.snapshot().failure_count, 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold_and_fails_fast() {
        let cb = breaker(3, 30_000, 1);
        for _ in 0..3 {
            let _ = fail(&cb).await;
        }
        assert_eq!(cb.state(), CircuitState::Open);

        let invoked = AtomicUsize::new(0);
        let result: TestResult = cb
            .execute(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok("should not run")
            })
            .await;

        assert!(result.unwrap_err().is_circuit_open());
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_until_timeout_then_probes_once() {
        let cb = breaker(1, 1000, 1);
        let _ = fail(&cb).await;

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(succeed(&cb).await.unwrap_err().is_circuit_open());
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(succeed(&cb).await.unwrap(), "ok");
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_needs_success_threshold() {
        let cb = breaker(2, 100, 3);
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        succeed(&cb).await.unwrap();
        succeed(&cb).await.unwrap();
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::HalfOpen);
        assert_eq!(snapshot.success_count, 2);

        succeed(&cb).await.unwrap();
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_and_discards_successes() {
        let cb = breaker(2, 100, 3);
        let _ = fail(&cb).await;
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        succeed(&cb).await.unwrap();
        assert_eq!(cb.snapshot().success_count, 1);

        let _ = fail(&cb).await;
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.success_count, 0);

        // Cooldown restarts from the probe failure.
        assert!(succeed(&cb).await.unwrap_err().is_circuit_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_probe_in_half_open() {
        let cb = Arc::new(breaker(1, 100, 1));
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let cb = cb.clone();
            tokio::spawn(async move {
                let result: TestResult = cb
                    .execute(move || async move {
                        let _ = release_rx.await;
                        Ok("probe")
                    })
                    .await;
                result
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        // Probe still running: everyone else is turned away.
        assert!(succeed(&cb).await.unwrap_err().is_circuit_open());

        release_tx.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "probe");
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_releases_slot() {
        let cb = breaker(1, 100, 2);
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        let hung: TestResult = tokio::time::timeout(
            Duration::from_millis(50),
            cb.execute(|| std::future::pending::<TestResult>()),
        )
        .await
        .unwrap_or(Ok("cancelled"));
        assert_eq!(hung.unwrap(), "cancelled");
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert_eq!(succeed(&cb).await.unwrap(), "ok");
        assert_eq!(cb.snapshot().success_count, 1);
    }

    fn spawn_held_call(
        cb: &Arc<CircuitBreaker>,
        label: &'static str,
    ) -> (tokio::sync::oneshot::Sender<()>, tokio::task::JoinHandle<TestResult>) {
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let cb = cb.clone();
        let handle = tokio::spawn(async move {
            cb.execute(move || async move {
                let _ = release_rx.await;
                Ok(label)
            })
            .await
        });
        (release_tx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_admitted_before_reset_cannot_free_new_slot() {
        let cb = Arc::new(breaker(1, 100, 2));
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        let (release_first, first) = spawn_held_call(&cb, "first");
        tokio::task::yield_now().await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.reset();
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::advance(Duration::from_millis(150)).await;

        let (release_second, second) = spawn_held_call(&cb, "second");
        tokio::task::yield_now().await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        // The pre-reset call finishing must not free the current slot.
        release_first.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), "first");
        assert!(succeed(&cb).await.unwrap_err().is_circuit_open());

        release_second.send(()).unwrap();
        assert_eq!(second.await.unwrap().unwrap(), "second");
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_frees_half_open_slot() {
        let cb = Arc::new(breaker(1, 100, 1));
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;

        let (release, held) = spawn_held_call(&cb, "held");
        tokio::task::yield_now().await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        // Trip again after the reset: the next probe must not wait on the held call.
        cb.reset();
        let _ = fail(&cb).await;
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(succeed(&cb).await.unwrap(), "ok");
        assert_eq!(cb.state(), CircuitState::Closed);

        release.send(()).unwrap();
        assert_eq!(held.await.unwrap().unwrap(), "held");
    }

    #[tokio::test]
    async fn test_reset() {
        let cb = breaker(1, 60_000, 1);
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);

        cb.reset();
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert!(snapshot.last_failure_time.is_none());
        assert_eq!(succeed(&cb).await.unwrap(), "ok");
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"HALF_OPEN\"");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
    }
}
