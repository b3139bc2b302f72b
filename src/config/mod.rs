//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResilienceConfig (validated, immutable)
//!     → BreakerRegistry / SafeCaller built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::CircuitBreakerConfig;
pub use schema::DependenciesConfig;
pub use schema::DependencyConfig;
pub use schema::HealthServerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ResilienceConfig;
pub use schema::RetryConfig;
pub use validation::ValidationError;
