use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Parent,
    Subsidiary,
}

/// A group company profile. `slug` is derived from `name` and never set
/// directly by callers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub company_type: CompanyType,
    pub description: Option<String>,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub history: Option<String>,
    pub services: Vec<String>,
    pub logo: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
