mod config;
mod cv;
mod errors;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackendKind};
use crate::cv::backend::{
    CollectionBackend, FileBackend, MemoryBackend, PostgresBackend, RedisBackend,
};
use crate::cv::store::CvStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a misconfigured backend)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ApplyAce API v{}", env!("CARGO_PKG_VERSION"));

    let backend = build_backend(&config).await?;
    info!("CV store backend: {}", backend.describe());

    let state = AppState {
        store: Arc::new(CvStore::with_backend(backend)),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Opens the collection slot selected by `CV_STORE_BACKEND`.
async fn build_backend(config: &Config) -> Result<Arc<dyn CollectionBackend>> {
    let backend: Arc<dyn CollectionBackend> = match config.store_backend {
        StoreBackendKind::Memory => Arc::new(MemoryBackend::new()),
        StoreBackendKind::File => Arc::new(FileBackend::new(&config.store_path)),
        StoreBackendKind::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            Arc::new(PostgresBackend::connect(url, &config.store_slot).await?)
        }
        StoreBackendKind::Redis => {
            let client = redis::Client::open(config.redis_url.clone().unwrap_or_default())?;
            info!("Redis client initialized");
            Arc::new(RedisBackend::connect(&client, &config.store_slot).await?)
        }
    };
    Ok(backend)
}
