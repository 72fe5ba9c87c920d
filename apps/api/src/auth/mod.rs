pub mod extract;
pub mod handlers;
pub mod password;
pub mod session;

use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;

/// Creates the initial admin account from SEED_ADMIN_EMAIL/PASSWORD when no
/// user with that email exists yet. A no-op when the variables are unset.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<()> {
    let (Some(email), Some(plain)) = (&config.seed_admin_email, &config.seed_admin_password)
    else {
        if config.seed_admin_email.is_some() || config.seed_admin_password.is_some() {
            warn!("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must both be set; skipping seed");
        }
        return Ok(());
    };

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hash = password::hash(plain)?;
    sqlx::query("INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'admin')")
        .bind(email)
        .bind(&hash)
        .execute(pool)
        .await?;

    info!("Seeded admin user {email}");
    Ok(())
}
