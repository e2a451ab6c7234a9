//! # deposit-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the deposit API over in-memory adapters.
//!
//! Environment:
//! - `DEPOSIT_CONFIG`: optional YAML file with the deposit configuration
//! - `DEPOSIT_SCHEMAS_URL`: overrides the schema base URL
//! - `PORT`: listen port (default 8080)
//! - `AUTH_TOKEN`: bearer secret; authentication is disabled when unset

use deposit_api::state::{AppConfig, AppState};
use deposit_core::DepositConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut deposit_config = match std::env::var("DEPOSIT_CONFIG") {
        Ok(path) => DepositConfig::from_file(&path).map_err(|e| {
            tracing::error!(path = %path, "failed to load deposit configuration: {e}");
            e
        })?,
        Err(_) => DepositConfig::default(),
    };
    if let Ok(url) = std::env::var("DEPOSIT_SCHEMAS_URL") {
        deposit_config.schemas_base_url = url;
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let auth_token = std::env::var("AUTH_TOKEN").ok();
    if auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication is disabled");
    }
    let config = AppConfig { port, auth_token };
    tracing::debug!(?config, ?deposit_config, "configuration loaded");

    let app = deposit_api::app(AppState::with_config(config, deposit_config));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("deposit API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
