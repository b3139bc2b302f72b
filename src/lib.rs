//! Integration resilience layer.
//!
//! Guards calls to external dependencies (database, AI provider, payment
//! processor, storage, vendor catalog, telephony) with one circuit breaker
//! each, bounded retries with backoff, optional per-attempt deadlines and
//! fallbacks for dependencies that may degrade.

// Core
pub mod config;
pub mod resilience;
pub mod services;

// Reporting
pub mod health;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ResilienceConfig;
pub use resilience::{BreakerRegistry, CircuitBreaker, CircuitState, ResilienceError, ResilienceResult};
pub use services::{Dependency, SafeCaller};
