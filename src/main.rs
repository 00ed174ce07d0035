//! Business calculation engine HTTP server.
//!
//! Loads the engine configuration from `ENGINE_CONFIG_DIR` (default
//! `./config/default`) and serves the JSON API on `ENGINE_PORT` (default 8080).

use std::net::SocketAddr;

use bizcalc_engine::api::{create_router, AppState};
use bizcalc_engine::config::{ConfigLoader, DEFAULT_CONFIG_DIR};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir =
        std::env::var("ENGINE_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let port: u16 = std::env::var("ENGINE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = ConfigLoader::load(&config_dir).map_err(|e| {
        tracing::error!(config_dir = %config_dir, "Failed to load configuration: {e}");
        e
    })?;
    tracing::info!(config_dir = %config_dir, "Configuration loaded");

    let app = create_router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("bizcalc-engine listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
