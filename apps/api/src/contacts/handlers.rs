use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as Jsonb;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::extract::AdminUser;
use crate::contacts::next_read_at;
use crate::errors::AppError;
use crate::models::contact::{
    Contact, ContactNote, ContactPriority, ContactReply, ContactStatus,
};
use crate::response::{ok, paginated, ApiResponse, PageQuery};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Internal triage note to append.
    pub note: Option<String>,
    /// Reply sent to the sender; also moves the status to `replied` unless
    /// an explicit status is supplied.
    pub reply: Option<String>,
}

/// POST /api/contacts — the public contact form.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateContactRequest>,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    let mut v = Validator::new();
    let name = v.require("name", req.name.as_deref());
    v.max_len("name", name.as_deref(), 120);
    let email = v.require("email", req.email.as_deref());
    v.email("email", email.as_deref());
    let phone = v.optional(req.phone.as_deref());
    let subject = v.require("subject", req.subject.as_deref());
    v.max_len("subject", subject.as_deref(), 200);
    let message = v.require("message", req.message.as_deref());
    v.max_len("message", message.as_deref(), 5000);
    let priority: Option<ContactPriority> =
        v.parse_enum("priority", req.priority.as_deref().or(Some("medium")));
    v.finish()?;

    let contact: Contact = sqlx::query_as(
        r#"
        INSERT INTO contacts (name, email, phone, subject, message, priority)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(name.unwrap())
    .bind(email.unwrap())
    .bind(&phone)
    .bind(subject.unwrap())
    .bind(message.unwrap())
    .bind(priority.unwrap())
    .fetch_one(&state.db)
    .await?;

    Ok(ok(contact))
}

/// GET /api/contacts
pub async fn handle_list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<ApiResponse<Vec<Contact>>>, AppError> {
    let mut v = Validator::new();
    let status: Option<ContactStatus> = v.parse_enum("status", query.status.as_deref());
    let priority: Option<ContactPriority> = v.parse_enum("priority", query.priority.as_deref());
    v.finish()?;

    let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
        qb.push(" WHERE 1=1");
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
    };

    let page = PageQuery::new(query.page, query.limit);

    let mut count_q = QueryBuilder::new("SELECT COUNT(*) FROM contacts");
    push_filters(&mut count_q);
    let total: i64 = count_q.build_query_scalar().fetch_one(&state.db).await?;

    let mut list_q = QueryBuilder::new("SELECT * FROM contacts");
    push_filters(&mut list_q);
    list_q
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let contacts: Vec<Contact> = list_q.build_query_as().fetch_all(&state.db).await?;

    Ok(paginated(contacts, page.pagination(total)))
}

/// GET /api/contacts/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    let contact: Option<Contact> = sqlx::query_as("SELECT * FROM contacts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let contact = contact.ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))?;
    Ok(ok(contact))
}

/// PUT /api/contacts/:id — status/priority changes, triage notes, reply.
pub async fn handle_update(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    let existing: Option<Contact> = sqlx::query_as("SELECT * FROM contacts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))?;

    let mut v = Validator::new();
    let explicit_status: Option<ContactStatus> = v.parse_enum("status", req.status.as_deref());
    let priority: ContactPriority = match req.priority.as_deref() {
        Some(raw) => v.parse_enum("priority", Some(raw)).unwrap_or(existing.priority),
        None => existing.priority,
    };
    let note = v.optional(req.note.as_deref());
    let reply_message = v.optional(req.reply.as_deref());
    v.finish()?;

    let now = Utc::now();

    // who did this — review notes and replies carry the staff email
    let author: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(session.user_id)
        .fetch_optional(&state.db)
        .await?;
    let author = author.map(|(e,)| e).unwrap_or_else(|| "admin".to_string());

    let status = match (explicit_status, reply_message.is_some()) {
        (Some(s), _) => s,
        (None, true) => ContactStatus::Replied,
        (None, false) => existing.status,
    };
    let read_at = next_read_at(existing.read_at, status, now);

    let mut notes = existing.notes.0.clone();
    if let Some(body) = note {
        notes.push(ContactNote {
            body,
            author: author.clone(),
            created_at: now,
        });
    }

    let reply = match reply_message {
        Some(message) => Some(ContactReply {
            message,
            replied_by: author,
            replied_at: now,
        }),
        None => existing.reply.map(|r| r.0),
    };

    let contact: Contact = sqlx::query_as(
        r#"
        UPDATE contacts SET
            status = $2, priority = $3, notes = $4, reply = $5, read_at = $6, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(priority)
    .bind(Jsonb(notes))
    .bind(reply.map(Jsonb))
    .bind(read_at)
    .fetch_one(&state.db)
    .await?;

    Ok(ok(contact))
}

/// DELETE /api/contacts/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Contact {id} not found")));
    }
    Ok(ok(json!({ "deleted": true })))
}
