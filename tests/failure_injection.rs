//! Failure injection through the safe-call entry points.

use std::time::Duration;

use integration_resilience::config::RetryConfig;
use integration_resilience::resilience::{CircuitState, ResilienceResult};
use integration_resilience::services::{Dependency, SafeCaller};

mod common;
use common::{single_attempt_config, FlakyOperation};

#[tokio::test(start_paused = true)]
async fn test_fallback_when_retries_exhausted() {
    let mut config = single_attempt_config(5, 30_000);
    config.ai.retry = RetryConfig::new(3, 100, 1_000);
    let caller = SafeCaller::from_config(config);
    let op = FlakyOperation::always_failing();

    let result = caller
        .call_or_else(Dependency::Ai, "suggest", || op.invoke(), || "fallback")
        .await;

    assert_eq!(result.unwrap(), "fallback");
    assert_eq!(op.calls(), 3);
    assert_eq!(caller.registry().get(Dependency::Ai).snapshot().failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_when_circuit_open() {
    let caller = SafeCaller::from_config(single_attempt_config(2, 30_000));
    let op = FlakyOperation::always_failing();

    for _ in 0..2 {
        let _ = caller.storage_or("upload", || op.invoke(), || "placeholder").await;
    }
    assert_eq!(caller.registry().get(Dependency::Storage).state(), CircuitState::Open);

    let value = caller.storage_or("upload", || op.invoke(), || "placeholder").await;
    assert_eq!(value, "placeholder");
    assert_eq!(op.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_error_propagates_without_fallback() {
    let caller = SafeCaller::from_config(single_attempt_config(2, 30_000));
    let op = FlakyOperation::always_failing();

    let err = caller.vendor("catalog", || op.invoke()).await.unwrap_err();
    assert_eq!(err.into_operation().as_deref(), Some("injected failure #1"));

    let _ = caller.vendor("catalog", || op.invoke()).await;
    let rejected: ResilienceResult<&str, String> = caller.vendor("catalog", || op.invoke()).await;
    assert!(rejected.unwrap_err().is_circuit_open());
    assert_eq!(op.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_critical_dependencies_never_degrade() {
    let caller = SafeCaller::from_config(single_attempt_config(1, 30_000));
    let op = FlakyOperation::always_failing();

    for dependency in [Dependency::Payment, Dependency::Telephony] {
        let result = caller.call_or_else(dependency, "send", || op.invoke(), || "fallback").await;
        assert!(result.is_err(), "{dependency} must propagate");
        assert_eq!(caller.registry().get(dependency).state(), CircuitState::Open);

        let rejected = caller.call_or_else(dependency, "send", || op.invoke(), || "fallback").await;
        assert!(rejected.unwrap_err().is_circuit_open());
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovery_after_cooldown() {
    let caller = SafeCaller::from_config(single_attempt_config(2, 5_000));
    let op = FlakyOperation::failing_first(2);

    for _ in 0..2 {
        let _ = caller.database("query", || op.invoke()).await;
    }
    assert_eq!(caller.registry().get(Dependency::Database).state(), CircuitState::Open);

    tokio::time::advance(Duration::from_millis(5_001)).await;
    for _ in 0..2 {
        assert_eq!(caller.database("query", || op.invoke()).await.unwrap(), "ok");
    }
    assert_eq!(caller.registry().get(Dependency::Database).state(), CircuitState::Closed);
}
