//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! resilience layer. All types derive Serde traits for deserialization from
//! config files. Defaults are the compiled-in tuning for each dependency.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::services::Dependency;

/// Root configuration for the resilience layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Health server settings.
    pub health: HealthServerConfig,

    /// Per-dependency breaker and retry tuning.
    pub dependencies: DependenciesConfig,
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) that open the circuit.
    pub failure_threshold: u32,

    /// Cooldown after the last failure before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Consecutive half-open successes that close the circuit.
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout_ms: u64, success_threshold: u32) -> Self {
        Self {
            failure_threshold,
            reset_timeout_ms,
            success_threshold,
        }
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, 30_000, 2)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Upper bound of the random extra added to each delay, as a fraction
    /// of that delay. 0.0 disables jitter.
    pub jitter_ratio: f64,

    /// Deadline for a single attempt in milliseconds. `None` lets an attempt
    /// run for as long as the operation takes.
    pub attempt_timeout_ms: Option<u64>,
}

impl RetryConfig {
    /// Deterministic backoff with no attempt deadline.
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            jitter_ratio: 0.0,
            attempt_timeout_ms: None,
        }
    }

    pub fn with_jitter(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout_ms: u64) -> Self {
        self.attempt_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3, 1000, 10_000).with_jitter(0.1)
    }
}

/// Breaker and retry tuning for one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DependencyConfig {
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
}

impl DependencyConfig {
    fn tuned(breaker: CircuitBreakerConfig, retry: RetryConfig) -> Self {
        Self { breaker, retry }
    }
}

/// Tuning for every guarded dependency.
///
/// Each field set in the config file overrides the compiled-in tuning of
/// that dependency only; omitted fields keep the dependency's own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(from = "DependencyOverrides")]
pub struct DependenciesConfig {
    pub database: DependencyConfig,
    pub ai: DependencyConfig,
    pub payment: DependencyConfig,
    pub storage: DependencyConfig,
    pub vendor: DependencyConfig,
    pub telephony: DependencyConfig,
}

impl DependenciesConfig {
    /// Tuning for a single dependency.
    pub fn get(&self, dependency: Dependency) -> &DependencyConfig {
        match dependency {
            Dependency::Database => &self.database,
            Dependency::Ai => &self.ai,
            Dependency::Payment => &self.payment,
            Dependency::Storage => &self.storage,
            Dependency::Vendor => &self.vendor,
            Dependency::Telephony => &self.telephony,
        }
    }

    pub fn get_mut(&mut self, dependency: Dependency) -> &mut DependencyConfig {
        match dependency {
            Dependency::Database => &mut self.database,
            Dependency::Ai => &mut self.ai,
            Dependency::Payment => &mut self.payment,
            Dependency::Storage => &mut self.storage,
            Dependency::Vendor => &mut self.vendor,
            Dependency::Telephony => &mut self.telephony,
        }
    }
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            database: DependencyConfig::tuned(
                CircuitBreakerConfig::new(3, 30_000, 2),
                RetryConfig::new(3, 100, 2_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(5_000),
            ),
            ai: DependencyConfig::tuned(
                CircuitBreakerConfig::new(5, 60_000, 2),
                RetryConfig::new(2, 1_000, 5_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(30_000),
            ),
            // Money is at stake: more attempts and a higher ceiling than AI.
            payment: DependencyConfig::tuned(
                CircuitBreakerConfig::new(3, 60_000, 2),
                RetryConfig::new(5, 1_000, 30_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(15_000),
            ),
            storage: DependencyConfig::tuned(
                CircuitBreakerConfig::new(5, 30_000, 2),
                RetryConfig::new(3, 500, 5_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(10_000),
            ),
            vendor: DependencyConfig::tuned(
                CircuitBreakerConfig::new(5, 60_000, 2),
                RetryConfig::new(3, 1_000, 10_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(10_000),
            ),
            telephony: DependencyConfig::tuned(
                CircuitBreakerConfig::new(3, 60_000, 2),
                RetryConfig::new(3, 1_000, 10_000)
                    .with_jitter(0.1)
                    .with_attempt_timeout(10_000),
            ),
        }
    }
}

/// Raw `[dependencies]` table, before merging onto the compiled tuning.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DependencyOverrides {
    database: DependencyOverride,
    ai: DependencyOverride,
    payment: DependencyOverride,
    storage: DependencyOverride,
    vendor: DependencyOverride,
    telephony: DependencyOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DependencyOverride {
    breaker: BreakerOverride,
    retry: RetryOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BreakerOverride {
    failure_threshold: Option<u32>,
    reset_timeout_ms: Option<u64>,
    success_threshold: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetryOverride {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    jitter_ratio: Option<f64>,
    attempt_timeout_ms: Option<u64>,
}

impl DependencyOverride {
    fn apply(self, base: &mut DependencyConfig) {
        let breaker = &mut base.breaker;
        breaker.failure_threshold = self.breaker.failure_threshold.unwrap_or(breaker.failure_threshold);
        breaker.reset_timeout_ms = self.breaker.reset_timeout_ms.unwrap_or(breaker.reset_timeout_ms);
        breaker.success_threshold = self.breaker.success_threshold.unwrap_or(breaker.success_threshold);

        let retry = &mut base.retry;
        retry.max_attempts = self.retry.max_attempts.unwrap_or(retry.max_attempts);
        retry.base_delay_ms = self.retry.base_delay_ms.unwrap_or(retry.base_delay_ms);
        retry.max_delay_ms = self.retry.max_delay_ms.unwrap_or(retry.max_delay_ms);
        retry.jitter_ratio = self.retry.jitter_ratio.unwrap_or(retry.jitter_ratio);
        if self.retry.attempt_timeout_ms.is_some() {
            retry.attempt_timeout_ms = self.retry.attempt_timeout_ms;
        }
    }
}

impl From<DependencyOverrides> for DependenciesConfig {
    fn from(overrides: DependencyOverrides) -> Self {
        let mut config = DependenciesConfig::default();
        overrides.database.apply(&mut config.database);
        overrides.ai.apply(&mut config.ai);
        overrides.payment.apply(&mut config.payment);
        overrides.storage.apply(&mut config.storage);
        overrides.vendor.apply(&mut config.vendor);
        overrides.telephony.apply(&mut config.telephony);
        config
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Health server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}
