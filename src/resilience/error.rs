//! Error types produced by the resilience layer.

use std::time::Duration;

use thiserror::Error;

/// A call was rejected by an open circuit without being attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit open for dependency '{dependency}'")]
pub struct CircuitOpenError {
    /// Name of the guarded dependency.
    pub dependency: String,
}

/// Failure of a guarded call.
///
/// The dependency's own error is carried unchanged in `Operation`.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The breaker is open (or its single probe slot is taken).
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// An attempt exceeded its deadline.
    #[error("{context} timed out after {after:?}")]
    Timeout { context: String, after: Duration },

    /// The operation itself failed on its final attempt.
    #[error("{0}")]
    Operation(E),
}

impl<E> ResilienceError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// The dependency's own error, if that is what failed.
    pub fn into_operation(self) -> Option<E> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&E> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for guarded calls.
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;
