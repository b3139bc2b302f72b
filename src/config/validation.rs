//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, delays ordered, ratios in range)
//! - Check bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DependencyConfig, ResilienceConfig};
use crate::services::Dependency;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{dependency}: {field} must be at least 1")]
    ZeroThreshold {
        dependency: &'static str,
        field: &'static str,
    },

    #[error("{dependency}: breaker.reset_timeout_ms must be greater than 0")]
    ZeroResetTimeout { dependency: &'static str },

    #[error("{dependency}: retry.base_delay_ms ({base}) exceeds retry.max_delay_ms ({max})")]
    DelayOrder {
        dependency: &'static str,
        base: u64,
        max: u64,
    },

    #[error("{dependency}: retry.jitter_ratio must be within 0.0..=1.0")]
    JitterRange { dependency: &'static str },

    #[error("{dependency}: retry.attempt_timeout_ms must be greater than 0 when set")]
    ZeroAttemptTimeout { dependency: &'static str },

    #[error("invalid {field} '{value}'")]
    BindAddress { field: &'static str, value: String },

    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for dependency in Dependency::ALL {
        validate_dependency(
            dependency.as_str(),
            config.dependencies.get(dependency),
            &mut errors,
        );
    }

    if config.health.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field: "health.bind_address",
            value: config.health.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_dependency(
    dependency: &'static str,
    config: &DependencyConfig,
    errors: &mut Vec<ValidationError>,
) {
    let breaker = &config.breaker;
    let retry = &config.retry;

    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold {
            dependency,
            field: "breaker.failure_threshold",
        });
    }
    if breaker.success_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold {
            dependency,
            field: "breaker.success_threshold",
        });
    }
    if breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::ZeroResetTimeout { dependency });
    }
    if retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroThreshold {
            dependency,
            field: "retry.max_attempts",
        });
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            dependency,
            base: retry.base_delay_ms,
            max: retry.max_delay_ms,
        });
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        errors.push(ValidationError::JitterRange { dependency });
    }
    if retry.attempt_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroAttemptTimeout { dependency });
    }
}
