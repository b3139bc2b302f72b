//! HTTP server for health reporting.
//!
//! # Responsibilities
//! - Create Axum Router with the health handlers
//! - Wire up middleware (tracing)
//! - Bind server to listener and stop on shutdown signal
//!
//! # Routes
//! - `GET /health`: aggregated status, 200 (healthy/degraded) or 503 (unhealthy)
//! - `GET /health/breakers`: raw breaker snapshots

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::health::{DependencyHealth, HealthReport};
use crate::resilience::BreakerRegistry;
use crate::services::Dependency;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BreakerRegistry>,
}

/// HTTP server exposing breaker health.
pub struct HealthServer {
    router: Router,
}

impl HealthServer {
    /// Create a new health server reading from `registry`.
    pub fn new(registry: Arc<BreakerRegistry>) -> Self {
        let router = Self::build_router(AppState { registry });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/health/breakers", get(breakers_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Health server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Health server received shutdown signal");
            })
            .await?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let report = HealthReport::collect(&state.registry);
    (report.status.http_status(), Json(report)).into_response()
}

#[derive(Serialize)]
struct BreakerEntry {
    dependency: Dependency,
    #[serde(flatten)]
    health: DependencyHealth,
}

async fn breakers_handler(State(state): State<AppState>) -> Json<Vec<BreakerEntry>> {
    let report = HealthReport::collect(&state.registry);
    let entries = Dependency::ALL
        .into_iter()
        .filter_map(|dependency| {
            report
                .dependencies
                .get(dependency.as_str())
                .cloned()
                .map(|health| BreakerEntry { dependency, health })
        })
        .collect();
    Json(entries)
}
