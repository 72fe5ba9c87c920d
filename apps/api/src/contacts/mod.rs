pub mod handlers;

use chrono::{DateTime, Utc};

use crate::models::contact::ContactStatus;

/// Computes the `read_at` stamp for a status change: set on the first
/// transition to `read`, untouched by anything else — including setting
/// `read` again later.
pub fn next_read_at(
    current: Option<DateTime<Utc>>,
    new_status: ContactStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, new_status) {
        (None, ContactStatus::Read) => Some(now),
        (existing, _) => existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_first_read_stamps() {
        let now = Utc::now();
        assert_eq!(next_read_at(None, ContactStatus::Read, now), Some(now));
    }

    #[test]
    fn test_second_read_keeps_original_stamp() {
        let first = Utc::now();
        let later = first + Duration::hours(3);
        assert_eq!(
            next_read_at(Some(first), ContactStatus::Read, later),
            Some(first)
        );
    }

    #[test]
    fn test_other_statuses_do_not_stamp() {
        let now = Utc::now();
        assert_eq!(next_read_at(None, ContactStatus::Replied, now), None);
        assert_eq!(next_read_at(None, ContactStatus::Archived, now), None);
    }

    #[test]
    fn test_stamp_survives_later_transitions() {
        let first = Utc::now();
        let later = first + Duration::days(1);
        assert_eq!(
            next_read_at(Some(first), ContactStatus::Archived, later),
            Some(first)
        );
    }
}
