//! Cross-entity consistency rules: the closed set of group company names,
//! the Career → Application cascade, and the cached client project counter.

use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::client::Client;

/// Company names a Project may be attributed to. Closed set, checked
/// case-sensitively at write time.
pub const GROUP_COMPANIES: &[&str] = &[
    "PT. Arimada Persada",
    "PT. Arimada Karya Mandiri",
    "PT. Arimada Beton Perkasa",
];

/// Subsidiaries that can hold certificates (the parent holds none itself).
pub const SUBSIDIARIES: &[&str] = &["PT. Arimada Karya Mandiri", "PT. Arimada Beton Perkasa"];

/// Case-sensitive membership in a closed set of proper names.
pub fn enum_relation(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}

/// Deletes a career and every application referencing it, atomically.
/// Returns the number of applications removed so the caller can report the
/// cascade outcome. If any step fails the whole delete rolls back — a
/// half-done cascade is never reported as success.
pub async fn delete_career_cascade(pool: &PgPool, career_id: Uuid) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM careers WHERE id = $1")
        .bind(career_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Career {career_id} not found")));
    }

    let removed = sqlx::query("DELETE FROM applications WHERE career_id = $1")
        .bind(career_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM careers WHERE id = $1")
        .bind(career_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Deleted career {career_id} and {removed} application(s)");
    Ok(removed)
}

/// Adjusts the cached `project_count` of the client with the given name.
/// Atomic in-place arithmetic, clamped at zero; a project naming no known
/// client is a no-op.
pub async fn adjust_client_project_count<'a, E>(
    exec: E,
    client_name: &str,
    delta: i32,
) -> Result<(), AppError>
where
    E: PgExecutor<'a>,
{
    sqlx::query(
        r#"
        UPDATE clients
        SET project_count = GREATEST(project_count + $2, 0), updated_at = now()
        WHERE name = $1
        "#,
    )
    .bind(client_name)
    .bind(delta)
    .execute(exec)
    .await?;
    Ok(())
}

/// Recomputes a client's `project_count` from live project rows. The stored
/// counter is a cache that can drift under partial failures; this is the
/// source of truth, invoked explicitly from the admin dashboard.
pub async fn recount_client_projects(pool: &PgPool, client_id: Uuid) -> Result<Client, AppError> {
    let client: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE id = $1")
        .bind(client_id)
        .fetch_optional(pool)
        .await?;
    let client = client.ok_or_else(|| AppError::NotFound(format!("Client {client_id} not found")))?;

    let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE client = $1")
        .bind(&client.name)
        .fetch_one(pool)
        .await?;

    let updated: Client = sqlx::query_as(
        "UPDATE clients SET project_count = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(client_id)
    .bind(live as i32)
    .fetch_one(pool)
    .await?;

    if updated.project_count != client.project_count {
        info!(
            "Recounted projects for client '{}': {} -> {}",
            client.name, client.project_count, updated.project_count
        );
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_relation_exact_match() {
        assert!(enum_relation("PT. Arimada Persada", GROUP_COMPANIES));
    }

    #[test]
    fn test_enum_relation_is_case_sensitive() {
        assert!(!enum_relation("pt. arimada persada", GROUP_COMPANIES));
        assert!(!enum_relation("PT. ARIMADA PERSADA", GROUP_COMPANIES));
    }

    #[test]
    fn test_enum_relation_rejects_outsiders() {
        assert!(!enum_relation("PT. Liar Jaya", GROUP_COMPANIES));
        assert!(!enum_relation("", GROUP_COMPANIES));
    }

    #[test]
    fn test_subsidiaries_are_group_companies() {
        for name in SUBSIDIARIES {
            assert!(enum_relation(name, GROUP_COMPANIES));
        }
    }

    #[test]
    fn test_parent_holds_no_certificates() {
        assert!(!enum_relation("PT. Arimada Persada", SUBSIDIARIES));
    }
}
