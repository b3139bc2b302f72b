//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers, retries and safe calls produce:
//!     → tracing events (transitions, retries, fallbacks)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Health server (breaker snapshots)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Every record carries the dependency name or call context
//! - Metrics are cheap and safe to record without an installed exporter

pub mod logging;
pub mod metrics;
