//! Prediction service
//!
//! HTTP front for the price predictor. The model bundle is loaded once at
//! startup; a bundle that fails to load stops the process.

mod api;
mod error;
mod state;
mod handlers;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{ManufacturersResponse, ModelsResponse, PredictResponse};
pub use state::AppState;

use crate::inference::ModelBundle;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub artifacts_dir: String,
    /// Year vehicle ages are measured against; `None` follows the clock
    pub reference_year: Option<i32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            artifacts_dir: std::env::var("ARTIFACTS_DIR").unwrap_or_else(|_| "./models".to_string()),
            reference_year: std::env::var("CARPRICE_REFERENCE_YEAR")
                .ok()
                .and_then(|y| y.parse().ok()),
        }
    }
}

/// Load the artifacts and serve until ctrl+c
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(artifacts_dir = %config.artifacts_dir, "Loading model bundle");

    let bundle = Arc::new(ModelBundle::load(&config.artifacts_dir)?);
    let state = Arc::new(AppState::new(config.clone(), bundle));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        reference_year = ?config.reference_year,
        started_at = %start_time.to_rfc3339(),
        "Car price service starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, serving until killed");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
