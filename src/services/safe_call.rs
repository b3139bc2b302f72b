//! Safe calls: breaker + retry + deadline per dependency.
//!
//! # Data Flow
//! ```text
//! SafeCaller::call(dependency, "operation", op)
//!     → registry breaker for `dependency` (fail fast when open)
//!     → with_retry(dependency tuning, context "dependency.operation")
//!     → with_deadline(per-attempt timeout)
//!     → op()
//! ```
//!
//! # Design Decisions
//! - Fallbacks absorb failures only for dependencies that may degrade
//! - Payment and telephony have no fallback entry point
//! - Absorbed failures are logged at warn level and counted

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::config::{DependenciesConfig, RetryConfig};
use crate::observability::metrics;
use crate::resilience::{with_deadline, with_retry, BreakerRegistry, ResilienceError, ResilienceResult};
use crate::services::dependency::Dependency;

/// Entry point application code uses to reach external dependencies.
#[derive(Debug, Clone)]
pub struct SafeCaller {
    registry: Arc<BreakerRegistry>,
    config: DependenciesConfig,
}

impl SafeCaller {
    /// Wrap an existing registry; `config` supplies the retry tuning.
    pub fn new(registry: Arc<BreakerRegistry>, config: DependenciesConfig) -> Self {
        Self { registry, config }
    }

    /// Build a fresh registry and caller from the same tuning.
    pub fn from_config(config: DependenciesConfig) -> Self {
        Self::new(Arc::new(BreakerRegistry::new(&config)), config)
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    pub fn retry_config(&self, dependency: Dependency) -> &RetryConfig {
        &self.config.get(dependency).retry
    }

    /// Call `operation` through the dependency's breaker with retries.
    ///
    /// Failures always propagate: `CircuitOpen` when the breaker rejected
    /// the call, otherwise the last attempt's `Timeout` or `Operation` error.
    pub async fn call<T, E, F, Fut>(
        &self,
        dependency: Dependency,
        context: &str,
        mut operation: F,
    ) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let context = format!("{}.{}", dependency.as_str(), context);
        let ctx = context.as_str();
        let retry = self.retry_config(dependency);
        let deadline = retry.attempt_timeout();

        self.registry
            .get(dependency)
            .execute(move || with_retry(move || with_deadline(deadline, ctx, operation()), retry, ctx))
            .await
    }

    /// Like [`call`](Self::call), substituting `fallback()` when the call
    /// ultimately fails.
    ///
    /// Dependencies that must not degrade (see
    /// [`Dependency::allows_fallback`]) ignore the fallback and propagate.
    pub async fn call_or_else<T, E, F, Fut, Fb>(
        &self,
        dependency: Dependency,
        context: &str,
        operation: F,
        fallback: Fb,
    ) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        if !dependency.allows_fallback() {
            tracing::debug!(
                dependency = dependency.as_str(),
                context,
                "Fallback ignored for critical dependency"
            );
            return self.call(dependency, context, operation).await;
        }

        Ok(self.degrade(dependency, context, operation, fallback).await)
    }

    async fn degrade<T, E, F, Fut, Fb>(&self, dependency: Dependency, context: &str, operation: F, fallback: Fb) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        match self.call(dependency, context, operation).await {
            Ok(value) => value,
            Err(error) => {
                log_degraded(dependency, context, &error);
                metrics::record_fallback(dependency.as_str());
                fallback()
            }
        }
    }

    // --- Per-dependency wrappers ---

    pub async fn database<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Database, context, operation).await
    }

    pub async fn database_or<T, E, F, Fut, Fb>(&self, context: &str, operation: F, fallback: Fb) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        self.degrade(Dependency::Database, context, operation, fallback).await
    }

    pub async fn ai<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Ai, context, operation).await
    }

    /// AI output is optional: on failure the caller gets `fallback()`.
    pub async fn ai_or<T, E, F, Fut, Fb>(&self, context: &str, operation: F, fallback: Fb) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        self.degrade(Dependency::Ai, context, operation, fallback).await
    }

    /// Payment processor calls. No fallback variant exists.
    pub async fn payment<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Payment, context, operation).await
    }

    pub async fn storage<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Storage, context, operation).await
    }

    pub async fn storage_or<T, E, F, Fut, Fb>(&self, context: &str, operation: F, fallback: Fb) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        self.degrade(Dependency::Storage, context, operation, fallback).await
    }

    pub async fn vendor<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Vendor, context, operation).await
    }

    pub async fn vendor_or<T, E, F, Fut, Fb>(&self, context: &str, operation: F, fallback: Fb) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Fb: FnOnce() -> T,
    {
        self.degrade(Dependency::Vendor, context, operation, fallback).await
    }

    /// Telephony (SMS/voice) calls. No fallback variant exists.
    pub async fn telephony<T, E, F, Fut>(&self, context: &str, operation: F) -> ResilienceResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.call(Dependency::Telephony, context, operation).await
    }
}

fn log_degraded<E: Display>(dependency: Dependency, context: &str, error: &ResilienceError<E>) {
    let reason = match error {
        ResilienceError::CircuitOpen(_) => "circuit_open",
        ResilienceError::Timeout { .. } => "timeout",
        ResilienceError::Operation(_) => "retries_exhausted",
    };
    tracing::warn!(
        dependency = dependency.as_str(),
        context,
        reason,
        error = %error,
        "Dependency degraded, using fallback"
    );
}
