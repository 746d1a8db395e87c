//! Fileitem API Server
//!
//! Main entry point for the file item storage service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileitem_api::{AppState, create_router};
use fileitem_core::storage::{StorageConfig, build_backend};
use fileitem_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileitem=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Invalid storage settings abort startup.
    let storage_config =
        StorageConfig::from_settings(&config.storage).context("invalid storage configuration")?;
    let backend = build_backend(&storage_config).context("failed to initialize storage")?;
    info!(
        backend = backend.name(),
        item_type = storage_config.file_type().as_str(),
        path_prefix = %storage_config.path_prefix,
        max_file_size = storage_config.max_file_size,
        max_files = storage_config.max_files,
        "Storage configured"
    );

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));
    let state = AppState::new(&storage_config, backend, jwt_service);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
