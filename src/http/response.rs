//! Response mapping for guarded calls.
//!
//! # Responsibilities
//! - Map resilience failures to appropriate HTTP status codes
//! - Keep dependency names and internal errors out of client responses
//!
//! # Design Decisions
//! - Circuit-open, timeout and exhausted-retry failures all become 503
//! - The real cause is logged server-side with its dependency context

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::resilience::ResilienceError;

/// Message shown to clients whenever a dependency is unavailable.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Generic 503 response.
pub fn service_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorBody {
            error: UNAVAILABLE_MESSAGE,
        }),
    )
        .into_response()
}

impl<E: Display> IntoResponse for ResilienceError<E> {
    fn into_response(self) -> Response {
        match &self {
            ResilienceError::CircuitOpen(open) => {
                tracing::warn!(dependency = %open.dependency, "Rejected request: circuit open");
            }
            ResilienceError::Timeout { context, after } => {
                tracing::error!(context = %context, timeout = ?after, "Request failed: dependency timed out");
            }
            ResilienceError::Operation(error) => {
                tracing::error!(error = %error, "Request failed: dependency error");
            }
        }
        service_unavailable()
    }
}
