use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemUploadStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::init_db;
use server::history::RetentionLocks;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;

    let uploads = FilesystemUploadStore::new(
        config.storage.data_dir.clone(),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to open upload storage")?;
    info!(data_dir = %config.storage.data_dir.display(), "Upload storage ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        db,
        uploads: Arc::new(uploads),
        retention_locks: Arc::new(RetentionLocks::default()),
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("API reference at http://{}/scalar", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
