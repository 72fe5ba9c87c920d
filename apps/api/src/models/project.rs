use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Building,
    Infrastructure,
    Industrial,
    Residential,
    Renovation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Completed,
    Ongoing,
    Planned,
}

/// A delivered or planned construction project. `company` is restricted to
/// the closed set of group company names, `client` references a client by
/// name and drives the cached `project_count` on the client record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub company: String,
    pub category: ProjectCategory,
    pub year: String,
    pub location: Option<String>,
    pub status: ProjectStatus,
    pub client: Option<String>,
    pub gallery: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
