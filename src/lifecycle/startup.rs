//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize observability from configuration
//! - Build the breaker registry and the safe caller around it
//! - Bind the health listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ResilienceConfig;
use crate::http::HealthServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::watch_signals;
use crate::observability::{logging, metrics};
use crate::resilience::BreakerRegistry;
use crate::services::SafeCaller;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("Invalid address '{value}' for {field}")]
    Address { field: &'static str, value: String },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Everything a running process shares: the registry and its caller.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub registry: Arc<BreakerRegistry>,
    pub caller: SafeCaller,
    pub shutdown: Shutdown,
}

impl Runtime {
    /// Build the breaker registry and safe caller from `config`.
    pub fn new(config: &ResilienceConfig) -> Self {
        let registry = Arc::new(BreakerRegistry::new(&config.dependencies));
        let caller = SafeCaller::new(registry.clone(), config.dependencies);
        Self {
            registry,
            caller,
            shutdown: Shutdown::new(),
        }
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address {
        field,
        value: value.to_string(),
    })
}

/// Start every subsystem and serve the health endpoint until a signal.
pub async fn run(config: ResilienceConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "integration-resilience starting");

    if config.observability.metrics_enabled {
        let addr = parse_address("metrics_address", &config.observability.metrics_address)?;
        metrics::init_metrics(addr);
    }

    let runtime = Runtime::new(&config);
    for (dependency, snapshot) in runtime.registry.snapshots() {
        tracing::debug!(dependency = %dependency, state = %snapshot.state, "Breaker ready");
    }

    let address = config.health.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HealthServer::new(runtime.registry.clone());
    let server_shutdown = runtime.shutdown.subscribe();
    let signals = watch_signals(runtime.shutdown.clone());

    server.run(listener, server_shutdown).await?;
    signals.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
