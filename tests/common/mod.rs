//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use integration_resilience::config::{CircuitBreakerConfig, DependenciesConfig, DependencyConfig, RetryConfig};
use integration_resilience::services::Dependency;

/// Counts invocations and fails the first `failures` of them.
#[derive(Clone, Default)]
pub struct FlakyOperation {
    calls: Arc<AtomicU32>,
    failures: u32,
}

impl FlakyOperation {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// One invocation of the operation.
    pub async fn invoke(&self) -> Result<&'static str, String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(format!("injected failure #{}", n + 1))
        } else {
            Ok("ok")
        }
    }
}

/// Every dependency with the same breaker tuning and a single attempt.
pub fn single_attempt_config(failure_threshold: u32, reset_timeout_ms: u64) -> DependenciesConfig {
    let mut config = DependenciesConfig::default();
    for dependency in Dependency::ALL {
        *config.get_mut(dependency) = DependencyConfig {
            breaker: CircuitBreakerConfig::new(failure_threshold, reset_timeout_ms, 2),
            retry: RetryConfig::new(1, 10, 10),
        };
    }
    config
}
