// src/main.rs
use std::sync::Arc;

use cube_store::api;
use cube_store::config::AppConfig;
use cube_store::store::InMemoryCubeStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // .env may set RUST_LOG, so it is read before the subscriber starts
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let store = Arc::new(InMemoryCubeStore::new());

    info!("🚀 Cube store starting...");
    api::start_api_server(app_config.api, app_config.layout, store).await
}
