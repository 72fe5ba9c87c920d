use anyhow::{bail, Context, Result};

/// Which file storage backend serves upload slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files land under `UPLOAD_DIR` and are served from `/uploads/...`.
    Disk,
    /// Files are kept as content-addressed inline descriptors, for
    /// deployments with no persistent disk.
    Inline,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing — in particular the
/// token signing key, so authentication can never run unsigned.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: String,
    pub storage_backend: StorageBackend,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "disk".to_string())
            .as_str()
        {
            "disk" => StorageBackend::Disk,
            "inline" => StorageBackend::Inline,
            other => bail!("STORAGE_BACKEND must be 'disk' or 'inline', got '{other}'"),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            storage_backend,
            seed_admin_email: std::env::var("SEED_ADMIN_EMAIL").ok(),
            seed_admin_password: std::env::var("SEED_ADMIN_PASSWORD").ok(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
