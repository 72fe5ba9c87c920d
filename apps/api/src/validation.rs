//! Field validation — a single pass over an incoming payload that collects
//! every violated constraint into a structured `FieldError` list, so a 400
//! response reports all problems at once instead of failing on the first.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::errors::{AppError, FieldError};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("year regex"));

/// Collects field errors across one validation pass.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Requires a non-empty value; returns it trimmed.
    pub fn require(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.push(field, format!("{field} is required"));
                None
            }
        }
    }

    /// Trims an optional value; empty strings collapse to `None`.
    pub fn optional(&mut self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.push(field, format!("{field} must be at most {max} characters"));
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !EMAIL_RE.is_match(v) {
                self.push(field, format!("{field} must be a valid email address"));
            }
        }
    }

    pub fn year(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !YEAR_RE.is_match(v) {
                self.push(field, format!("{field} must be a 4-digit year"));
            }
        }
    }

    /// Parses an RFC 3339 timestamp.
    pub fn datetime(
        &mut self,
        field: &str,
        value: Option<&str>,
    ) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = value?.trim();
        match chrono::DateTime::parse_from_rfc3339(raw) {
            Ok(d) => Some(d.with_timezone(&chrono::Utc)),
            Err(_) => {
                self.push(field, format!("{field} must be an RFC 3339 timestamp"));
                None
            }
        }
    }

    /// Parses an ISO `YYYY-MM-DD` date.
    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<chrono::NaiveDate> {
        let raw = value?.trim();
        match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.push(field, format!("{field} must be a date in YYYY-MM-DD form"));
                None
            }
        }
    }

    /// Parses a raw string into one of the closed enum types via its serde
    /// representation, recording a field error on any out-of-set value.
    pub fn parse_enum<T: DeserializeOwned>(&mut self, field: &str, raw: Option<&str>) -> Option<T> {
        let raw = raw?.trim();
        match serde_json::from_value(serde_json::Value::String(raw.to_string())) {
            Ok(v) => Some(v),
            Err(_) => {
                self.push(field, format!("'{raw}' is not a valid {field}"));
                None
            }
        }
    }

    /// Case-sensitive closed-set membership, used for relation fields whose
    /// allowed values are proper names rather than enum variants.
    pub fn member_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) {
        if let Some(v) = value {
            if !crate::relations::enum_relation(v, allowed) {
                self.push(field, format!("'{v}' is not a valid {field}"));
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::ClientCategory;

    #[test]
    fn test_require_trims_and_accepts() {
        let mut v = Validator::new();
        assert_eq!(v.require("name", Some("  Wijaya  ")), Some("Wijaya".into()));
        assert!(v.is_ok());
    }

    #[test]
    fn test_require_rejects_blank() {
        let mut v = Validator::new();
        assert_eq!(v.require("name", Some("   ")), None);
        assert_eq!(v.require("email", None), None);
        let err = v.finish().unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "name");
                assert_eq!(fields[1].field, "email");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_email_format() {
        let mut v = Validator::new();
        v.email("email", Some("info@arimada.co.id"));
        assert!(v.is_ok());
        v.email("email", Some("not-an-email"));
        assert!(!v.is_ok());
    }

    #[test]
    fn test_year_format() {
        let mut v = Validator::new();
        v.year("year", Some("2024"));
        assert!(v.is_ok());
        v.year("year", Some("24"));
        v.year("year", Some("twenty"));
        assert!(v.finish().is_err());
    }

    #[test]
    fn test_parse_enum_accepts_kebab_values() {
        let mut v = Validator::new();
        let parsed: Option<ClientCategory> = v.parse_enum("category", Some("state-owned"));
        assert_eq!(parsed, Some(ClientCategory::StateOwned));
        assert!(v.is_ok());
    }

    #[test]
    fn test_parse_enum_rejects_unknown_value() {
        let mut v = Validator::new();
        let parsed: Option<ClientCategory> = v.parse_enum("category", Some("municipal"));
        assert_eq!(parsed, None);
        assert!(!v.is_ok());
    }

    #[test]
    fn test_member_of_is_case_sensitive() {
        let mut v = Validator::new();
        v.member_of("company", Some("pt. arimada persada"), &["PT. Arimada Persada"]);
        assert!(!v.is_ok());
    }

    #[test]
    fn test_single_pass_collects_every_violation() {
        let mut v = Validator::new();
        v.require("title", None);
        v.email("email", Some("bad"));
        v.year("year", Some("9"));
        match v.finish().unwrap_err() {
            AppError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
