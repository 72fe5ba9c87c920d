use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::companies::slug::slugify;
use crate::errors::AppError;
use crate::models::company::{Company, CompanyType};
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

/// Create and update share one payload; create requires `name`.
#[derive(Debug, Deserialize)]
pub struct CompanyPayload {
    pub name: Option<String>,
    pub company_type: Option<String>,
    pub description: Option<String>,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub history: Option<String>,
    pub services: Option<Vec<String>>,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// GET /api/companies
pub async fn handle_list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Company>>>, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
        .fetch_one(&state.db)
        .await?;
    let companies: Vec<Company> =
        sqlx::query_as("SELECT * FROM companies ORDER BY sort_order, name LIMIT $1 OFFSET $2")
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&state.db)
            .await?;
    Ok(paginated(companies, page.pagination(total)))
}

/// GET /api/companies/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Company>>, AppError> {
    let company: Option<Company> = sqlx::query_as("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let company = company.ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;
    Ok(ok(company))
}

/// POST /api/companies
pub async fn handle_create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<CompanyPayload>,
) -> Result<Json<ApiResponse<Company>>, AppError> {
    let mut v = Validator::new();
    let name = v.require("name", req.name.as_deref());
    v.max_len("name", name.as_deref(), 200);
    let company_type: Option<CompanyType> =
        v.parse_enum("company_type", req.company_type.as_deref().or(Some("subsidiary")));
    if let Some(n) = name.as_deref() {
        if slugify(n).is_empty() {
            v.push("name", "name must contain at least one letter or digit");
        }
    }
    v.finish()?;
    let name = name.unwrap();

    let company: Company = sqlx::query_as(
        r#"
        INSERT INTO companies
            (name, slug, company_type, description, vision, mission, history,
             services, logo, is_active, sort_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(slugify(&name))
    .bind(company_type.unwrap())
    .bind(&req.description)
    .bind(&req.vision)
    .bind(&req.mission)
    .bind(&req.history)
    .bind(req.services.unwrap_or_default())
    .bind(&req.logo)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.sort_order.unwrap_or(0))
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::from_insert(e, "company slug"))?;

    Ok(ok(company))
}

/// PUT /api/companies/:id
///
/// Partial update: only supplied fields change. A new `name` regenerates the
/// slug; nothing else can touch it.
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CompanyPayload>,
) -> Result<Json<ApiResponse<Company>>, AppError> {
    let existing: Option<Company> = sqlx::query_as("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    let mut v = Validator::new();
    let name = match req.name.as_deref() {
        Some(raw) => {
            let n = v.require("name", Some(raw));
            v.max_len("name", n.as_deref(), 200);
            if let Some(n) = n.as_deref() {
                if slugify(n).is_empty() {
                    v.push("name", "name must contain at least one letter or digit");
                }
            }
            n.unwrap_or(existing.name.clone())
        }
        None => existing.name.clone(),
    };
    let company_type: CompanyType = match req.company_type.as_deref() {
        Some(raw) => v
            .parse_enum("company_type", Some(raw))
            .unwrap_or(existing.company_type),
        None => existing.company_type,
    };
    v.finish()?;

    let slug = slugify(&name);

    let company: Company = sqlx::query_as(
        r#"
        UPDATE companies SET
            name = $2, slug = $3, company_type = $4, description = $5,
            vision = $6, mission = $7, history = $8, services = $9,
            logo = $10, is_active = $11, sort_order = $12, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&name)
    .bind(&slug)
    .bind(company_type)
    .bind(req.description.or(existing.description))
    .bind(req.vision.or(existing.vision))
    .bind(req.mission.or(existing.mission))
    .bind(req.history.or(existing.history))
    .bind(req.services.unwrap_or(existing.services))
    .bind(req.logo.or(existing.logo))
    .bind(req.is_active.unwrap_or(existing.is_active))
    .bind(req.sort_order.unwrap_or(existing.sort_order))
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::from_insert(e, "company slug"))?;

    Ok(ok(company))
}

/// DELETE /api/companies/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Company {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}
