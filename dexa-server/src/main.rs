use anyhow::{bail, Context, Result};
use dexa_api::observability::{init_logging, init_metrics};
use dexa_api::{AppState, OpenAiGateway};
use dexa_core::BlobStore;
use dexa_storage::postgres::{self, PostgresConfig};
use dexa_storage::{MemoryBlobStore, MemoryStore, S3BlobStore};
use std::net::SocketAddr;
use std::sync::Arc;

mod config;

use config::{Config, StorageBackend};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.log).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    init_metrics()?;

    tracing::info!("Starting DEXA server");

    if config.llm.api_key.trim().is_empty() {
        bail!("llm.api_key must be set (DEXA__LLM__API_KEY)");
    }
    let llm = Arc::new(OpenAiGateway::new(config.llm.clone())?);
    tracing::info!(model = %config.llm.model, "Completion gateway initialized");

    let blobs: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::S3 => {
            let store = S3BlobStore::from_config(&config.storage.s3()).await;
            tracing::info!(bucket = store.bucket(), "S3 blob store initialized");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Uploaded files are kept in memory and lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let settings = config.api_settings();
    let state = match config.database_url.as_deref() {
        Some(url) => {
            let pool = postgres::create_pool(&PostgresConfig::new(url)).await?;
            postgres::migrate(&pool).await?;
            tracing::info!("Database pool initialized and migrations applied");
            AppState::new(pool, blobs, llm, settings)
        }
        None => {
            tracing::warn!("No database_url configured; metadata is kept in memory");
            AppState::with_memory_store(Arc::new(MemoryStore::new()), blobs, llm, settings)
        }
    };

    let app = dexa_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
