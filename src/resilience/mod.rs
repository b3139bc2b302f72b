//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call to a dependency:
//!     → registry.rs (look up the dependency's breaker)
//!     → circuit_breaker.rs (fail fast if open, track outcome otherwise)
//!     → retries.rs (retry with backoff.rs delays)
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → operation
//! ```
//!
//! # Design Decisions
//! - The breaker sees one outcome per guarded call, after retries
//! - Retries and breakers are usable on their own; `services` composes them
//! - The dependency's own error travels back unchanged inside `ResilienceError`

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod registry;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use error::{CircuitOpenError, ResilienceError, ResilienceResult};
pub use registry::BreakerRegistry;
pub use retries::with_retry;
pub use timeouts::with_deadline;
