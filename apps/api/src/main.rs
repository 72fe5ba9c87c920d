mod applications;
mod auth;
mod careers;
mod certificates;
mod clients;
mod companies;
mod config;
mod contacts;
mod db;
mod errors;
mod models;
mod projects;
mod relations;
mod response;
mod routes;
mod state;
mod storage;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{DiskStore, FileStore, InlineStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars,
    // including the token signing key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("gapura_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gapura CMS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (pool is created once and reused across requests)
    let db = create_pool(&config.database_url).await?;

    // Bootstrap the first admin account when configured
    auth::seed_admin(&db, &config).await?;

    // Select the upload storage backend
    let files: Arc<dyn FileStore> = match config.storage_backend {
        StorageBackend::Disk => Arc::new(DiskStore::new(&config.upload_dir)),
        StorageBackend::Inline => Arc::new(InlineStore),
    };
    info!("File storage backend: {:?}", config.storage_backend);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        files,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
