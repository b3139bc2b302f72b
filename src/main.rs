//! integration-resilience daemon.
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!   app code ─────▶│ SafeCaller ─▶ breaker ─▶ retry ─▶ deadline ─┼──▶ dependency
//!                  │      │                                       │
//!                  │      ▼                                       │
//!                  │ BreakerRegistry ◀── GET /health ◀────────────┼─── probes / CLI
//!                  └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use integration_resilience::config::{load_config, ResilienceConfig};
use integration_resilience::lifecycle;

#[derive(Parser)]
#[command(name = "integration-resilience")]
#[command(about = "Circuit breakers and health reporting for external dependencies", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long, env = "RESILIENCE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => load_config(&path)?,
        None => ResilienceConfig::default(),
    };

    lifecycle::run(config).await?;
    Ok(())
}
