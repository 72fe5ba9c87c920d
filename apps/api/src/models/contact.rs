use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contact_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contact_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Unread,
    Read,
    Replied,
    Archived,
    Spam,
}

/// An internal note appended by staff while triaging a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactNote {
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactReply {
    pub message: String,
    pub replied_by: String,
    pub replied_at: DateTime<Utc>,
}

/// An inbound message from the public contact form. `read_at` is stamped on
/// the first transition to `read` and never overwritten afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub priority: ContactPriority,
    pub status: ContactStatus,
    pub notes: Json<Vec<ContactNote>>,
    pub reply: Option<Json<ContactReply>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
