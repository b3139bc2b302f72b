//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! BreakerRegistry snapshots
//!     → state.rs (per-dependency contribution, overall status)
//!     → HealthReport
//!     → http/server.rs (`GET /health`, 200 or 503)
//! ```
//!
//! # Design Decisions
//! - Health is read from breakers; breakers are fed by real traffic
//! - The worst dependency decides the overall status
//! - Health state is per-process, like the breakers it reads

pub mod state;

pub use state::{DependencyHealth, HealthReport, HealthStatus};
