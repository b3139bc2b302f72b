//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define resilience metrics (transitions, rejections, retries, fallbacks)
//! - Expose Prometheus-compatible metrics endpoint
//! - Tag everything by dependency or call context
//!
//! # Metrics
//! - `resilience_breaker_transitions_total` (counter): transitions by dependency, target state
//! - `resilience_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `resilience_rejections_total` (counter): fail-fast rejections by dependency
//! - `resilience_retries_total` (counter): retries by call context
//! - `resilience_attempt_timeouts_total` (counter): expired attempts by call context
//! - `resilience_fallbacks_total` (counter): fallback substitutions by dependency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, libraries)
//! - Labels are dependency names or `dependency.operation` contexts

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a breaker state change.
pub fn record_transition(dependency: &str, to: CircuitState) {
    counter!(
        "resilience_breaker_transitions_total",
        "dependency" => dependency.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(dependency, to);
}

/// Publish the current state of a breaker.
pub fn record_breaker_state(dependency: &str, state: CircuitState) {
    gauge!("resilience_breaker_state", "dependency" => dependency.to_string()).set(state as u8 as f64);
}

/// Record a call rejected by an open circuit.
pub fn record_rejection(dependency: &str) {
    counter!("resilience_rejections_total", "dependency" => dependency.to_string()).increment(1);
}

/// Record a retry about to be scheduled.
pub fn record_retry(context: &str) {
    counter!("resilience_retries_total", "context" => context.to_string()).increment(1);
}

/// Record an attempt that exceeded its deadline.
pub fn record_attempt_timeout(context: &str) {
    counter!("resilience_attempt_timeouts_total", "context" => context.to_string()).increment(1);
}

/// Record a failure absorbed by a fallback value.
pub fn record_fallback(dependency: &str) {
    counter!("resilience_fallbacks_total", "dependency" => dependency.to_string()).increment(1);
}
