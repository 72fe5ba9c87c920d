use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as Jsonb;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::careers::workflow::{application_terminal, application_transition_allowed};
use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationStatus, InterviewMode, InterviewSchedule, ReviewNote,
};
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewRequest {
    pub scheduled_at: Option<String>,
    pub location: Option<String>,
    pub mode: Option<String>,
    pub notes: Option<String>,
}

async fn reviewer_email(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    Ok(row.map(|(e,)| e).unwrap_or_else(|| "admin".to_string()))
}

async fn fetch_application(state: &AppState, id: Uuid) -> Result<Application, AppError> {
    let application: Option<Application> =
        sqlx::query_as("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    application.ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// GET /api/careers/:id/applications
pub async fn handle_list_for_career(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(career_id): Path<Uuid>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApiResponse<Vec<Application>>>, AppError> {
    let mut v = Validator::new();
    let status: Option<ApplicationStatus> = v.parse_enum("status", query.status.as_deref());
    v.finish()?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM careers WHERE id = $1")
        .bind(career_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Career {career_id} not found")));
    }

    let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
        qb.push(" WHERE career_id = ").push_bind(career_id);
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
    };

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM applications");
    push_filters(&mut count_q);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM applications");
    push_filters(&mut list_q);
    list_q
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let applications: Vec<Application> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(applications, page.pagination(total)))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    Ok(ok(fetch_application(&state, id).await?))
}

/// PATCH /api/applications/:id/status
///
/// Moves the application through the review pipeline; an optional note is
/// appended to the review trail stamped with the reviewer and new status.
pub async fn handle_update_status(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let mut v = Validator::new();
    let next: Option<ApplicationStatus> = v.parse_enum("status", req.status.as_deref());
    if req.status.is_none() {
        v.push("status", "status is required");
    }
    let note = v.optional(req.note.as_deref());
    v.finish()?;
    let next = next.unwrap();

    let existing = fetch_application(&state, id).await?;
    if !application_transition_allowed(existing.status, next) {
        return Err(AppError::invalid(
            "status",
            format!(
                "cannot move a {} application to {}",
                existing.status.as_str(),
                next.as_str()
            ),
        ));
    }

    let mut review_notes = existing.review_notes.0;
    if let Some(body) = note {
        review_notes.push(ReviewNote {
            note: body,
            reviewer: reviewer_email(&state, session.user_id).await?,
            status: next,
            created_at: Utc::now(),
        });
    }

    let application: Application = sqlx::query_as(
        r#"
        UPDATE applications SET status = $2, review_notes = $3, last_updated = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next)
    .bind(Jsonb(review_notes))
    .fetch_one(&state.db)
    .await?;

    info!("Application {id} moved to {}", next.as_str());
    Ok(ok(application))
}

/// POST /api/applications/:id/interview
///
/// Scheduling forces the status to `interview` from any live state — the
/// pipeline order is deliberately not consulted here. Terminal applications
/// cannot be scheduled.
pub async fn handle_schedule_interview(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<InterviewRequest>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let mut v = Validator::new();
    let scheduled_at = v.datetime("scheduled_at", req.scheduled_at.as_deref());
    if req.scheduled_at.is_none() {
        v.push("scheduled_at", "scheduled_at is required");
    }
    let location = v.require("location", req.location.as_deref());
    let mode: Option<InterviewMode> = v.parse_enum("mode", req.mode.as_deref().or(Some("onsite")));
    let notes = v.optional(req.notes.as_deref());
    v.finish()?;

    let existing = fetch_application(&state, id).await?;
    if application_terminal(existing.status) {
        return Err(AppError::invalid(
            "status",
            format!(
                "cannot schedule an interview for a {} application",
                existing.status.as_str()
            ),
        ));
    }

    let schedule = InterviewSchedule {
        scheduled_at: scheduled_at.unwrap(),
        location: location.unwrap(),
        mode: mode.unwrap(),
        notes,
    };

    let mut review_notes = existing.review_notes.0;
    review_notes.push(ReviewNote {
        note: format!("Interview scheduled for {}", schedule.scheduled_at),
        reviewer: reviewer_email(&state, session.user_id).await?,
        status: ApplicationStatus::Interview,
        created_at: Utc::now(),
    });

    let application: Application = sqlx::query_as(
        r#"
        UPDATE applications SET
            status = 'interview', interview_schedule = $2, review_notes = $3, last_updated = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(Jsonb(&schedule))
    .bind(Jsonb(review_notes))
    .fetch_one(&state.db)
    .await?;

    Ok(ok(application))
}

/// DELETE /api/applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}
