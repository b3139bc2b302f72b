//! Aggregated health state.
//!
//! # States
//! - Healthy: every breaker closed
//! - Degraded: some non-essential breaker open or probing; service still answers
//! - Unhealthy: an essential dependency's breaker is open
//!
//! # Design Decisions
//! - Derived from breaker snapshots only; no probes of its own
//! - Degraded still reports 200 so load balancers keep routing traffic
//! - Unhealthy reports 503

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Serialize;
use tokio::time::Instant;

use crate::resilience::{BreakerRegistry, BreakerSnapshot, CircuitState};
use crate::services::Dependency;

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn http_status(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Contribution of a single dependency to the overall status.
    fn of(dependency: Dependency, state: CircuitState) -> Self {
        match state {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::Open if dependency.is_essential() => HealthStatus::Unhealthy,
            CircuitState::Open | CircuitState::HalfOpen => HealthStatus::Degraded,
        }
    }
}

/// Serializable view of one breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyHealth {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// Milliseconds since the last recorded failure.
    pub last_failure_ms_ago: Option<u64>,
}

impl DependencyHealth {
    fn from_snapshot(snapshot: &BreakerSnapshot, now: Instant) -> Self {
        Self {
            state: snapshot.state,
            failure_count: snapshot.failure_count,
            success_count: snapshot.success_count,
            last_failure_ms_ago: snapshot
                .last_failure_time
                .map(|at| now.saturating_duration_since(at).as_millis() as u64),
        }
    }
}

/// Health of the whole integration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub dependencies: BTreeMap<&'static str, DependencyHealth>,
}

impl HealthReport {
    /// Build a report from the current state of every breaker.
    pub fn collect(registry: &BreakerRegistry) -> Self {
        Self::from_snapshots(&registry.snapshots())
    }

    pub fn from_snapshots(snapshots: &[(Dependency, BreakerSnapshot)]) -> Self {
        let now = Instant::now();
        let status = snapshots
            .iter()
            .map(|(dependency, snapshot)| HealthStatus::of(*dependency, snapshot.state))
            .max()
            .unwrap_or(HealthStatus::Healthy);

        let dependencies = snapshots
            .iter()
            .map(|(dependency, snapshot)| {
                (dependency.as_str(), DependencyHealth::from_snapshot(snapshot, now))
            })
            .collect();

        Self { status, dependencies }
    }
}
