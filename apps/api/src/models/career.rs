use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employment_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    Contract,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    MidLevel,
    Senior,
    Managerial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "career_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CareerStatus {
    Draft,
    Active,
    Closed,
    Archived,
}

impl CareerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CareerStatus::Draft => "draft",
            CareerStatus::Active => "active",
            CareerStatus::Closed => "closed",
            CareerStatus::Archived => "archived",
        }
    }
}

/// A job posting. `application_count` and `views` are counters maintained
/// with atomic SQL increments; `publish_date` is stamped on the first
/// transition into `active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Career {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub description: String,
    pub requirements: Vec<String>,
    pub status: CareerStatus,
    pub application_count: i32,
    pub views: i32,
    pub publish_date: Option<DateTime<Utc>>,
    pub close_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
