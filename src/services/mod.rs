//! Per-dependency "safe call" wrappers.
//!
//! Application code (orders, invoicing, vendor sync, notifications) reaches
//! every external system through [`SafeCaller`], which composes the
//! dependency's circuit breaker, retry policy and attempt deadline.

pub mod dependency;
pub mod safe_call;

pub use dependency::{Dependency, UnknownDependency};
pub use safe_call::SafeCaller;
