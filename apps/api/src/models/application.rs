use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::storage::StoredFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Shortlisted,
    Interview,
    Test,
    Offered,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Test => "test",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: Option<String>,
    pub summary: Option<String>,
}

/// The document set attached to an application, one entry per upload slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDocuments {
    pub resume: StoredFile,
    pub cover_letter: Option<StoredFile>,
    pub portfolio: Option<StoredFile>,
    pub certificates: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewNote {
    pub note: String,
    pub reviewer: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSchedule {
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub mode: InterviewMode,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Onsite,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub career_id: Uuid,
    pub applicant: Json<Applicant>,
    pub documents: Json<ApplicationDocuments>,
    pub status: ApplicationStatus,
    pub review_notes: Json<Vec<ReviewNote>>,
    pub interview_schedule: Option<Json<InterviewSchedule>>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
