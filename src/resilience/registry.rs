//! Breaker registry.
//!
//! # Responsibilities
//! - Own exactly one circuit breaker per guarded dependency
//! - Hand out shared references for callers and health reporting
//!
//! # Design Decisions
//! - Built once from config and passed around by `Arc`, never a global
//! - Every dependency gets its breaker at construction, so lookups cannot fail
//! - Breakers are independent: no state is shared between dependencies

use std::sync::Arc;

use crate::config::DependenciesConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};
use crate::services::Dependency;

/// One named circuit breaker per external dependency.
#[derive(Debug)]
pub struct BreakerRegistry {
    /// Indexed by `Dependency as usize`.
    breakers: Vec<Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Create the breakers for every dependency from configuration.
    pub fn new(config: &DependenciesConfig) -> Self {
        let breakers = Dependency::ALL
            .iter()
            .map(|dependency| {
                let breaker_config = config.get(*dependency).breaker;
                tracing::debug!(
                    dependency = dependency.as_str(),
                    failure_threshold = breaker_config.failure_threshold,
                    reset_timeout_ms = breaker_config.reset_timeout_ms,
                    success_threshold = breaker_config.success_threshold,
                    "Circuit breaker created"
                );
                Arc::new(CircuitBreaker::new(dependency.as_str(), breaker_config))
            })
            .collect();

        Self { breakers }
    }

    /// The breaker guarding `dependency`.
    pub fn get(&self, dependency: Dependency) -> &Arc<CircuitBreaker> {
        &self.breakers[dependency as usize]
    }

    /// Snapshot of every breaker, in `Dependency::ALL` order.
    pub fn snapshots(&self) -> Vec<(Dependency, BreakerSnapshot)> {
        Dependency::ALL
            .iter()
            .map(|dependency| (*dependency, self.get(*dependency).snapshot()))
            .collect()
    }

    /// Force every breaker closed.
    pub fn reset_all(&self) {
        for breaker in &self.breakers {
            breaker.reset();
        }
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(&DependenciesConfig::default())
    }
}
