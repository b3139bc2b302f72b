//! HTTP surface of the resilience layer.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → server.rs (Axum router, trace layer)
//!     → health::HealthReport (breaker snapshots)
//!     → JSON + 200/503
//!
//! Application handlers returning ResilienceError
//!     → response.rs (generic 503, cause logged)
//! ```

pub mod response;
pub mod server;

pub use response::{service_unavailable, UNAVAILABLE_MESSAGE};
pub use server::{AppState, HealthServer};
