use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::errors::AppError;
use crate::models::certificate::{Certificate, CertificateStatus, CertificateType};
use crate::relations::SUBSIDIARIES;
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CertificateListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub subsidiary: Option<String>,
    #[serde(rename = "type")]
    pub cert_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CertificatePayload {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub cert_type: Option<String>,
    pub subsidiary: Option<String>,
    pub issuer: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub status: Option<String>,
    pub image: Option<String>,
}

/// GET /api/certificates
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<CertificateListQuery>,
) -> Result<Json<ApiResponse<Vec<Certificate>>>, AppError> {
    let mut v = Validator::new();
    let cert_type: Option<CertificateType> = v.parse_enum("type", query.cert_type.as_deref());
    let status: Option<CertificateStatus> = v.parse_enum("status", query.status.as_deref());
    v.finish()?;

    let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
        qb.push(" WHERE 1=1");
        if let Some(subsidiary) = &query.subsidiary {
            qb.push(" AND subsidiary = ").push_bind(subsidiary.clone());
        }
        if let Some(cert_type) = cert_type {
            qb.push(" AND cert_type = ").push_bind(cert_type);
        }
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
    };

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM certificates");
    push_filters(&mut count_q);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM certificates");
    push_filters(&mut list_q);
    list_q
        .push(" ORDER BY issue_date DESC NULLS LAST, title LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let certificates: Vec<Certificate> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(certificates, page.pagination(total)))
}

/// GET /api/certificates/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Certificate>>, AppError> {
    let certificate: Option<Certificate> =
        sqlx::query_as("SELECT * FROM certificates WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let certificate =
        certificate.ok_or_else(|| AppError::NotFound(format!("Certificate {id} not found")))?;
    Ok(ok(certificate))
}

/// POST /api/certificates
pub async fn handle_create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<CertificatePayload>,
) -> Result<Json<ApiResponse<Certificate>>, AppError> {
    let mut v = Validator::new();
    let title = v.require("title", req.title.as_deref());
    v.max_len("title", title.as_deref(), 200);
    let cert_type: Option<CertificateType> = v.parse_enum("type", req.cert_type.as_deref());
    if req.cert_type.is_none() {
        v.push("type", "type is required");
    }
    let subsidiary = v.require("subsidiary", req.subsidiary.as_deref());
    v.member_of("subsidiary", subsidiary.as_deref(), SUBSIDIARIES);
    let issue_date = v.date("issue_date", req.issue_date.as_deref());
    let expiry_date = v.date("expiry_date", req.expiry_date.as_deref());
    let status: Option<CertificateStatus> =
        v.parse_enum("status", req.status.as_deref().or(Some("active")));
    v.finish()?;

    let certificate: Certificate = sqlx::query_as(
        r#"
        INSERT INTO certificates
            (title, cert_type, subsidiary, issuer, issue_date, expiry_date, status, image)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(title.unwrap())
    .bind(cert_type.unwrap())
    .bind(subsidiary.unwrap())
    .bind(&req.issuer)
    .bind(issue_date)
    .bind(expiry_date)
    .bind(status.unwrap())
    .bind(&req.image)
    .fetch_one(&state.db)
    .await?;

    Ok(ok(certificate))
}

/// PUT /api/certificates/:id
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CertificatePayload>,
) -> Result<Json<ApiResponse<Certificate>>, AppError> {
    let existing: Option<Certificate> = sqlx::query_as("SELECT * FROM certificates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing =
        existing.ok_or_else(|| AppError::NotFound(format!("Certificate {id} not found")))?;

    let mut v = Validator::new();
    let title = match req.title.as_deref() {
        Some(raw) => v.require("title", Some(raw)).unwrap_or(existing.title.clone()),
        None => existing.title.clone(),
    };
    let cert_type: CertificateType = match req.cert_type.as_deref() {
        Some(raw) => v.parse_enum("type", Some(raw)).unwrap_or(existing.cert_type),
        None => existing.cert_type,
    };
    let subsidiary = match req.subsidiary.as_deref() {
        Some(raw) => {
            v.member_of("subsidiary", Some(raw), SUBSIDIARIES);
            raw.to_string()
        }
        None => existing.subsidiary.clone(),
    };
    let issue_date = match req.issue_date.as_deref() {
        Some(raw) => v.date("issue_date", Some(raw)),
        None => existing.issue_date,
    };
    let expiry_date = match req.expiry_date.as_deref() {
        Some(raw) => v.date("expiry_date", Some(raw)),
        None => existing.expiry_date,
    };
    let status: CertificateStatus = match req.status.as_deref() {
        Some(raw) => v.parse_enum("status", Some(raw)).unwrap_or(existing.status),
        None => existing.status,
    };
    v.finish()?;

    let certificate: Certificate = sqlx::query_as(
        r#"
        UPDATE certificates SET
            title = $2, cert_type = $3, subsidiary = $4, issuer = $5,
            issue_date = $6, expiry_date = $7, status = $8, image = $9, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&title)
    .bind(cert_type)
    .bind(&subsidiary)
    .bind(req.issuer.or(existing.issuer))
    .bind(issue_date)
    .bind(expiry_date)
    .bind(status)
    .bind(req.image.or(existing.image))
    .fetch_one(&state.db)
    .await?;

    Ok(ok(certificate))
}

/// DELETE /api/certificates/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let result = sqlx::query("DELETE FROM certificates WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Certificate {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}
