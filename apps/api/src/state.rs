use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable upload storage. Disk or inline, selected by STORAGE_BACKEND.
    pub files: Arc<dyn FileStore>,
}
