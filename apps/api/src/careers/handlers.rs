use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as Jsonb;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::careers::workflow::{career_transition_allowed, stamps_publish_date};
use crate::errors::AppError;
use crate::models::application::{Applicant, Application, ApplicationDocuments};
use crate::models::career::{Career, CareerStatus, EmploymentType, ExperienceLevel};
use crate::relations::delete_career_cascade;
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::storage::{self, UploadSlot, UploadedFile, MAX_FILES_PER_APPLICATION};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CareerListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CareerPayload {
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub status: Option<String>,
    pub close_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: Option<String>,
}

fn career_filters<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    location: &Option<String>,
    experience_level: Option<ExperienceLevel>,
    status: Option<CareerStatus>,
    q: &Option<String>,
) {
    qb.push(" WHERE 1=1");
    if let Some(location) = location {
        qb.push(" AND location ILIKE ").push_bind(format!("%{location}%"));
    }
    if let Some(level) = experience_level {
        qb.push(" AND experience_level = ").push_bind(level);
    }
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(q) = q {
        qb.push(" AND (title ILIKE ")
            .push_bind(format!("%{q}%"))
            .push(" OR description ILIKE ")
            .push_bind(format!("%{q}%"))
            .push(")");
    }
}

/// GET /api/careers — public listing; only `active` postings are visible.
pub async fn handle_public_list(
    State(state): State<AppState>,
    Query(query): Query<CareerListQuery>,
) -> Result<Json<ApiResponse<Vec<Career>>>, AppError> {
    let mut v = Validator::new();
    let level: Option<ExperienceLevel> =
        v.parse_enum("experience_level", query.experience_level.as_deref());
    v.finish()?;

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM careers");
    career_filters(
        &mut count_q,
        &query.location,
        level,
        Some(CareerStatus::Active),
        &query.q,
    );
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM careers");
    career_filters(
        &mut list_q,
        &query.location,
        level,
        Some(CareerStatus::Active),
        &query.q,
    );
    list_q
        .push(" ORDER BY publish_date DESC NULLS LAST LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let careers: Vec<Career> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(careers, page.pagination(total)))
}

/// GET /api/careers/:id — public detail; bumps the view counter atomically.
pub async fn handle_public_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Career>>, AppError> {
    let career: Option<Career> = sqlx::query_as(
        "UPDATE careers SET views = views + 1 WHERE id = $1 AND status = 'active' RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    let career = career.ok_or_else(|| AppError::NotFound(format!("Career {id} not found")))?;
    Ok(ok(career))
}

/// GET /api/careers/all — admin listing across every status.
pub async fn handle_admin_list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(query): Query<CareerListQuery>,
) -> Result<Json<ApiResponse<Vec<Career>>>, AppError> {
    let mut v = Validator::new();
    let level: Option<ExperienceLevel> =
        v.parse_enum("experience_level", query.experience_level.as_deref());
    let status: Option<CareerStatus> = v.parse_enum("status", query.status.as_deref());
    v.finish()?;

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM careers");
    career_filters(&mut count_q, &query.location, level, status, &query.q);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM careers");
    career_filters(&mut list_q, &query.location, level, status, &query.q);
    list_q
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let careers: Vec<Career> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(careers, page.pagination(total)))
}

/// POST /api/careers
pub async fn handle_create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<CareerPayload>,
) -> Result<Json<ApiResponse<Career>>, AppError> {
    let mut v = Validator::new();
    let title = v.require("title", req.title.as_deref());
    v.max_len("title", title.as_deref(), 200);
    let department = v.require("department", req.department.as_deref());
    let location = v.require("location", req.location.as_deref());
    let employment_type: Option<EmploymentType> =
        v.parse_enum("employment_type", req.employment_type.as_deref().or(Some("full-time")));
    let experience_level: Option<ExperienceLevel> =
        v.parse_enum("experience_level", req.experience_level.as_deref());
    if req.experience_level.is_none() {
        v.push("experience_level", "experience_level is required");
    }
    let description = v.require("description", req.description.as_deref());
    let close_date = v.datetime("close_date", req.close_date.as_deref());
    if req.close_date.is_none() {
        v.push("close_date", "close_date is required");
    }
    let status: Option<CareerStatus> = v.parse_enum("status", req.status.as_deref().or(Some("draft")));
    v.finish()?;
    let status = status.unwrap();

    // a posting created directly as active is published now
    let publish_date = if status == CareerStatus::Active {
        Some(Utc::now())
    } else {
        None
    };

    let career: Career = sqlx::query_as(
        r#"
        INSERT INTO careers
            (title, department, location, employment_type, experience_level,
             description, requirements, status, publish_date, close_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(title.unwrap())
    .bind(department.unwrap())
    .bind(location.unwrap())
    .bind(employment_type.unwrap())
    .bind(experience_level.unwrap())
    .bind(description.unwrap())
    .bind(req.requirements.unwrap_or_default())
    .bind(status)
    .bind(publish_date)
    .bind(close_date.unwrap())
    .fetch_one(&state.db)
    .await?;

    Ok(ok(career))
}

/// PUT /api/careers/:id — content fields only; status moves through
/// PATCH /api/careers/:id/status so every change passes the state machine.
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CareerPayload>,
) -> Result<Json<ApiResponse<Career>>, AppError> {
    let existing: Option<Career> = sqlx::query_as("SELECT * FROM careers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Career {id} not found")))?;

    let mut v = Validator::new();
    if req.status.is_some() {
        v.push("status", "status changes go through PATCH /api/careers/:id/status");
    }
    let title = match req.title.as_deref() {
        Some(raw) => v.require("title", Some(raw)).unwrap_or(existing.title.clone()),
        None => existing.title.clone(),
    };
    let department = match req.department.as_deref() {
        Some(raw) => v.require("department", Some(raw)).unwrap_or(existing.department.clone()),
        None => existing.department.clone(),
    };
    let location = match req.location.as_deref() {
        Some(raw) => v.require("location", Some(raw)).unwrap_or(existing.location.clone()),
        None => existing.location.clone(),
    };
    let employment_type: EmploymentType = match req.employment_type.as_deref() {
        Some(raw) => v
            .parse_enum("employment_type", Some(raw))
            .unwrap_or(existing.employment_type),
        None => existing.employment_type,
    };
    let experience_level: ExperienceLevel = match req.experience_level.as_deref() {
        Some(raw) => v
            .parse_enum("experience_level", Some(raw))
            .unwrap_or(existing.experience_level),
        None => existing.experience_level,
    };
    let description = match req.description.as_deref() {
        Some(raw) => v
            .require("description", Some(raw))
            .unwrap_or(existing.description.clone()),
        None => existing.description.clone(),
    };
    let close_date = match req.close_date.as_deref() {
        Some(raw) => v.datetime("close_date", Some(raw)).unwrap_or(existing.close_date),
        None => existing.close_date,
    };
    v.finish()?;

    let career: Career = sqlx::query_as(
        r#"
        UPDATE careers SET
            title = $2, department = $3, location = $4, employment_type = $5,
            experience_level = $6, description = $7, requirements = $8,
            close_date = $9, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&title)
    .bind(&department)
    .bind(&location)
    .bind(employment_type)
    .bind(experience_level)
    .bind(&description)
    .bind(req.requirements.unwrap_or(existing.requirements))
    .bind(close_date)
    .fetch_one(&state.db)
    .await?;

    Ok(ok(career))
}

/// PATCH /api/careers/:id/status
pub async fn handle_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<ApiResponse<Career>>, AppError> {
    let mut v = Validator::new();
    let next: Option<CareerStatus> = v.parse_enum("status", req.status.as_deref());
    if req.status.is_none() {
        v.push("status", "status is required");
    }
    v.finish()?;
    let next = next.unwrap();

    let existing: Option<Career> = sqlx::query_as("SELECT * FROM careers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Career {id} not found")))?;

    if !career_transition_allowed(existing.status, next) {
        return Err(AppError::invalid(
            "status",
            format!(
                "cannot move a {} posting to {}",
                existing.status.as_str(),
                next.as_str()
            ),
        ));
    }

    let publish_date = if stamps_publish_date(next, existing.publish_date) {
        Some(Utc::now())
    } else {
        existing.publish_date
    };

    let career: Career = sqlx::query_as(
        r#"
        UPDATE careers SET status = $2, publish_date = $3, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next)
    .bind(publish_date)
    .fetch_one(&state.db)
    .await?;

    info!("Career {id} moved to {}", next.as_str());
    Ok(ok(career))
}

/// DELETE /api/careers/:id — cascades to the posting's applications.
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let removed = delete_career_cascade(&state.db, id).await?;
    Ok(ok(json!({ "deleted": true, "removed_applications": removed })))
}

/// Collected multipart form for one application: text fields plus the
/// buffered files, keyed by slot.
#[derive(Default)]
struct ApplyForm {
    fields: HashMap<String, String>,
    resume: Option<UploadedFile>,
    cover_letter: Option<UploadedFile>,
    portfolio: Option<UploadedFile>,
    certificates: Vec<UploadedFile>,
}

/// Validates applicant text fields, reporting every problem in one pass.
fn validate_applicant(fields: &HashMap<String, String>) -> Result<Applicant, AppError> {
    let get = |k: &str| fields.get(k).map(String::as_str);

    let mut v = Validator::new();
    let name = v.require("name", get("name"));
    v.max_len("name", name.as_deref(), 120);
    let email = v.require("email", get("email"));
    v.email("email", email.as_deref());
    let phone = v.require("phone", get("phone"));
    let linkedin = v.optional(get("linkedin"));
    let summary = v.optional(get("summary"));
    v.max_len("summary", summary.as_deref(), 2000);
    v.finish()?;

    Ok(Applicant {
        name: name.unwrap(),
        email: email.unwrap(),
        phone: phone.unwrap(),
        linkedin,
        summary,
    })
}

/// POST /api/careers/:id/apply — public, multipart.
///
/// The whole body is buffered before any validation. The application insert
/// and the posting's counter increment commit in one transaction; the
/// increment is in-place SQL arithmetic, never read-modify-write.
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    // 1. Only an existing, active posting accepts applications
    let career: Option<Career> =
        sqlx::query_as("SELECT * FROM careers WHERE id = $1 AND status = 'active'")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    if career.is_none() {
        return Err(AppError::NotFound(format!(
            "Career {id} not found or not accepting applications"
        )));
    }

    // 2. Drain the form
    let mut form = ApplyForm::default();
    let mut file_count = 0usize;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid("body", format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match UploadSlot::from_field_name(&name) {
            Some(slot) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::invalid(&name, format!("failed to read uploaded file: {e}"))
                })?;
                file_count += 1;
                if file_count > MAX_FILES_PER_APPLICATION {
                    return Err(AppError::invalid(
                        "files",
                        format!("at most {MAX_FILES_PER_APPLICATION} files per application"),
                    ));
                }
                let file = UploadedFile {
                    filename,
                    content_type,
                    bytes,
                };
                match slot {
                    UploadSlot::Resume => form.resume = Some(file),
                    UploadSlot::CoverLetter => form.cover_letter = Some(file),
                    UploadSlot::Portfolio => form.portfolio = Some(file),
                    UploadSlot::CertificateDoc => form.certificates.push(file),
                    _ => {}
                }
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    AppError::invalid(&name, format!("failed to read field: {e}"))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    // 3. Validate before anything is stored
    let applicant = validate_applicant(&form.fields)?;
    let resume = form
        .resume
        .ok_or_else(|| AppError::invalid("resume", "resume is required"))?;

    // 4. Persist the documents
    let store = state.files.as_ref();
    let resume = storage::accept(store, &resume, UploadSlot::Resume).await?;
    let cover_letter = match &form.cover_letter {
        Some(f) => Some(storage::accept(store, f, UploadSlot::CoverLetter).await?),
        None => None,
    };
    let portfolio = match &form.portfolio {
        Some(f) => Some(storage::accept(store, f, UploadSlot::Portfolio).await?),
        None => None,
    };
    let mut certificates = Vec::with_capacity(form.certificates.len());
    for f in &form.certificates {
        certificates.push(storage::accept(store, f, UploadSlot::CertificateDoc).await?);
    }
    let documents = ApplicationDocuments {
        resume,
        cover_letter,
        portfolio,
        certificates,
    };

    // 5. Application row and counter increment commit together
    let mut tx = state.db.begin().await?;
    let application: Application = sqlx::query_as(
        r#"
        INSERT INTO applications (career_id, applicant, documents)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(Jsonb(&applicant))
    .bind(Jsonb(&documents))
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE careers SET application_count = application_count + 1, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("New application {} for career {id}", application.id);
    Ok(ok(application))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_applicant() {
        let a = validate_applicant(&form(&[
            ("name", "Rina Wulandari"),
            ("email", "rina@example.com"),
            ("phone", "+62 812 3456 7890"),
        ]))
        .unwrap();
        assert_eq!(a.name, "Rina Wulandari");
        assert!(a.linkedin.is_none());
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let err = validate_applicant(&form(&[("email", "not-an-email")])).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                let named: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert!(named.contains(&"name"));
                assert!(named.contains(&"email"));
                assert!(named.contains(&"phone"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_optional_fields_collapse() {
        let a = validate_applicant(&form(&[
            ("name", "Budi"),
            ("email", "budi@example.com"),
            ("phone", "0812"),
            ("linkedin", "   "),
        ]))
        .unwrap();
        assert!(a.linkedin.is_none());
    }
}
