//! Failure predictor - machine failure prediction service
//!
//! Loads the classifier and explainer artifacts once, then serves the
//! prediction form and JSON API until interrupted.

use anyhow::Result;
use failure_predictor::{api, config::ServerConfig, initialize};
use predictor_lib::StructuredLogger;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting failure-predictor");

    let config = ServerConfig::load()?;
    info!(
        classifier = %config.classifier_path.display(),
        explainer = %config.explainer_path.display(),
        "Service configured"
    );

    let logger = StructuredLogger::new(SERVICE_NAME);

    // Artifact load failure is fatal: no degraded no-model mode
    let state = initialize(&config, logger.clone()).await?;
    state.health_registry.set_ready(true).await;

    let listen_addr = config.listen_addr();
    logger.log_startup(SERVICE_VERSION, &listen_addr);

    let shutdown_logger = logger.clone();
    api::serve(&listen_addr, state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shut down");
    Ok(())
}
