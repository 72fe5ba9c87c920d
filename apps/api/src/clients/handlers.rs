use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::errors::AppError;
use crate::models::client::{Client, ClientCategory, ClientStatus};
use crate::relations::recount_client_projects;
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientPayload {
    pub name: Option<String>,
    pub category: Option<String>,
    pub logo: Option<String>,
    pub status: Option<String>,
}

/// GET /api/clients
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<ApiResponse<Vec<Client>>>, AppError> {
    let mut v = Validator::new();
    let category: Option<ClientCategory> = v.parse_enum("category", query.category.as_deref());
    let status: Option<ClientStatus> = v.parse_enum("status", query.status.as_deref());
    v.finish()?;

    let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
        qb.push(" WHERE 1=1");
        if let Some(category) = category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
    };

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM clients");
    push_filters(&mut count_q);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM clients");
    push_filters(&mut list_q);
    list_q
        .push(" ORDER BY name LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let clients: Vec<Client> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(clients, page.pagination(total)))
}

/// GET /api/clients/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let client: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let client = client.ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))?;
    Ok(ok(client))
}

/// POST /api/clients
pub async fn handle_create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<ClientPayload>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let mut v = Validator::new();
    let name = v.require("name", req.name.as_deref());
    v.max_len("name", name.as_deref(), 200);
    let category: Option<ClientCategory> = v.parse_enum("category", req.category.as_deref());
    if req.category.is_none() {
        v.push("category", "category is required");
    }
    let status: Option<ClientStatus> =
        v.parse_enum("status", req.status.as_deref().or(Some("active")));
    v.finish()?;

    let client: Client = sqlx::query_as(
        "INSERT INTO clients (name, category, logo, status) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(name.unwrap())
    .bind(category.unwrap())
    .bind(&req.logo)
    .bind(status.unwrap())
    .fetch_one(&state.db)
    .await?;

    Ok(ok(client))
}

/// PUT /api/clients/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ClientPayload>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let existing: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Client {id} not found")))?;

    let mut v = Validator::new();
    let name = match req.name.as_deref() {
        Some(raw) => v.require("name", Some(raw)).unwrap_or(existing.name.clone()),
        None => existing.name.clone(),
    };
    let category: ClientCategory = match req.category.as_deref() {
        Some(raw) => v.parse_enum("category", Some(raw)).unwrap_or(existing.category),
        None => existing.category,
    };
    let status: ClientStatus = match req.status.as_deref() {
        Some(raw) => v.parse_enum("status", Some(raw)).unwrap_or(existing.status),
        None => existing.status,
    };
    v.finish()?;

    let client: Client = sqlx::query_as(
        r#"
        UPDATE clients SET name = $2, category = $3, logo = $4, status = $5, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&name)
    .bind(category)
    .bind(req.logo.or(existing.logo))
    .bind(status)
    .fetch_one(&state.db)
    .await?;

    Ok(ok(client))
}

/// DELETE /api/clients/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Client {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}

/// POST /api/clients/:id/recalculate
///
/// The stored `project_count` is a cache; this recomputes it from live
/// project rows and persists the fresh value.
pub async fn handle_recalculate(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let client = recount_client_projects(&state.db, id).await?;
    Ok(ok(client))
}
