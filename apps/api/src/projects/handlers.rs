use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::errors::AppError;
use crate::models::project::{Project, ProjectCategory, ProjectStatus};
use crate::relations::{self, GROUP_COMPANIES};
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub year: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub year: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub client: Option<String>,
    pub gallery: Option<Vec<String>>,
}

struct ProjectFilters {
    company: Option<String>,
    category: Option<ProjectCategory>,
    status: Option<ProjectStatus>,
    year: Option<String>,
    q: Option<String>,
}

fn parse_filters(query: &ProjectListQuery) -> Result<ProjectFilters, AppError> {
    let mut v = Validator::new();
    let category = v.parse_enum("category", query.category.as_deref());
    let status = v.parse_enum("status", query.status.as_deref());
    v.finish()?;
    Ok(ProjectFilters {
        company: query.company.clone(),
        category,
        status,
        year: query.year.clone(),
        q: query.q.clone(),
    })
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, f: &ProjectFilters) {
    qb.push(" WHERE 1=1");
    if let Some(company) = &f.company {
        qb.push(" AND company = ").push_bind(company.clone());
    }
    if let Some(category) = f.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(status) = f.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(year) = &f.year {
        qb.push(" AND year = ").push_bind(year.clone());
    }
    if let Some(q) = &f.q {
        qb.push(" AND title ILIKE ").push_bind(format!("%{q}%"));
    }
}

/// GET /api/projects
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ApiResponse<Vec<Project>>>, AppError> {
    let filters = parse_filters(&query)?;
    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM projects");
    push_filters(&mut count_q, &filters);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM projects");
    push_filters(&mut list_q, &filters);
    list_q
        .push(" ORDER BY year DESC, created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let projects: Vec<Project> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(projects, page.pagination(total)))
}

/// GET /api/projects/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let project: Option<Project> = sqlx::query_as("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let project = project.ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    Ok(ok(project))
}

/// POST /api/projects
///
/// Inserting the project and bumping the owning client's cached counter
/// happen in one transaction.
pub async fn handle_create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<ProjectPayload>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let mut v = Validator::new();
    let title = v.require("title", req.title.as_deref());
    v.max_len("title", title.as_deref(), 200);
    let company = v.require("company", req.company.as_deref());
    v.member_of("company", company.as_deref(), GROUP_COMPANIES);
    let category: Option<ProjectCategory> = v.parse_enum("category", req.category.as_deref());
    if req.category.is_none() {
        v.push("category", "category is required");
    }
    let year = v.require("year", req.year.as_deref());
    v.year("year", year.as_deref());
    let status: Option<ProjectStatus> =
        v.parse_enum("status", req.status.as_deref().or(Some("planned")));
    let client = v.optional(req.client.as_deref());
    v.finish()?;

    let mut tx = state.db.begin().await?;
    let project: Project = sqlx::query_as(
        r#"
        INSERT INTO projects
            (title, description, company, category, year, location, status, client, gallery)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(title.unwrap())
    .bind(&req.description)
    .bind(company.unwrap())
    .bind(category.unwrap())
    .bind(year.unwrap())
    .bind(&req.location)
    .bind(status.unwrap())
    .bind(&client)
    .bind(req.gallery.unwrap_or_default())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(name) = &client {
        relations::adjust_client_project_count(&mut *tx, name, 1).await?;
    }
    tx.commit().await?;

    Ok(ok(project))
}

/// PUT /api/projects/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectPayload>,
) -> Result<Json<ApiResponse<Project>>, AppError> {
    let existing: Option<Project> = sqlx::query_as("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;

    let mut v = Validator::new();
    let title = match req.title.as_deref() {
        Some(raw) => {
            let t = v.require("title", Some(raw));
            v.max_len("title", t.as_deref(), 200);
            t.unwrap_or(existing.title.clone())
        }
        None => existing.title.clone(),
    };
    let company = match req.company.as_deref() {
        Some(raw) => {
            v.member_of("company", Some(raw), GROUP_COMPANIES);
            raw.to_string()
        }
        None => existing.company.clone(),
    };
    let category: ProjectCategory = match req.category.as_deref() {
        Some(raw) => v.parse_enum("category", Some(raw)).unwrap_or(existing.category),
        None => existing.category,
    };
    let year = match req.year.as_deref() {
        Some(raw) => {
            v.year("year", Some(raw));
            raw.to_string()
        }
        None => existing.year.clone(),
    };
    let status: ProjectStatus = match req.status.as_deref() {
        Some(raw) => v.parse_enum("status", Some(raw)).unwrap_or(existing.status),
        None => existing.status,
    };
    let client = match req.client.as_deref() {
        Some(raw) => v.optional(Some(raw)),
        None => existing.client.clone(),
    };
    v.finish()?;

    let mut tx = state.db.begin().await?;
    let project: Project = sqlx::query_as(
        r#"
        UPDATE projects SET
            title = $2, description = $3, company = $4, category = $5, year = $6,
            location = $7, status = $8, client = $9, gallery = $10, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&title)
    .bind(req.description.or(existing.description))
    .bind(&company)
    .bind(category)
    .bind(&year)
    .bind(req.location.or(existing.location))
    .bind(status)
    .bind(&client)
    .bind(req.gallery.unwrap_or(existing.gallery))
    .fetch_one(&mut *tx)
    .await?;

    // reattributed to a different client: move the cached count with it
    if existing.client != client {
        if let Some(old) = &existing.client {
            relations::adjust_client_project_count(&mut *tx, old, -1).await?;
        }
        if let Some(new) = &client {
            relations::adjust_client_project_count(&mut *tx, new, 1).await?;
        }
    }
    tx.commit().await?;

    Ok(ok(project))
}

/// DELETE /api/projects/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let existing: Option<Project> = sqlx::query_as("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if let Some(name) = &existing.client {
        relations::adjust_client_project_count(&mut *tx, name, -1).await?;
    }
    tx.commit().await?;

    Ok(ok(json!({ "deleted": true })))
}
