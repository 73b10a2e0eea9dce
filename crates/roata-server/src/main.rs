//! # Roata Server
//!
//! Live vehicle positions and route assignments over HTTP, fed from the
//! message bus.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! roata
//!
//! # Run with a specific config file
//! roata /path/to/roata.toml
//!
//! # Run with environment variables
//! ROATA_PORT=8000 ROATA_BROKER_URL=nats://bus:4222 roata
//! ```

mod config;
mod handlers;
mod ingest;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roata=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Roata v{}", roata_protocol::SERVICE_VERSION);

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = config::Config::load(config_path.as_deref())?;

    tracing::info!("Binding HTTP on {}:{}", config.host, config.port);

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
