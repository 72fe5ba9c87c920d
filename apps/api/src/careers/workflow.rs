//! The posting and application state machines. Pure functions — handlers
//! load the current state, consult these, and persist the result.

use chrono::{DateTime, Utc};

use crate::models::application::ApplicationStatus;
use crate::models::career::CareerStatus;

/// Posting lifecycle: draft → active → closed → archived, where a closed
/// posting can be re-opened (active ↔ closed). No other edges.
pub fn career_transition_allowed(from: CareerStatus, to: CareerStatus) -> bool {
    use CareerStatus::*;
    matches!(
        (from, to),
        (Draft, Active) | (Active, Closed) | (Closed, Active) | (Closed, Archived)
    )
}

/// `publish_date` is stamped the first time a posting goes active and is
/// never rewritten by later re-activations.
pub fn stamps_publish_date(to: CareerStatus, existing: Option<DateTime<Utc>>) -> bool {
    to == CareerStatus::Active && existing.is_none()
}

/// Accepted, rejected and withdrawn applications never move again.
pub fn application_terminal(status: ApplicationStatus) -> bool {
    use ApplicationStatus::*;
    matches!(status, Accepted | Rejected | Withdrawn)
}

/// Review pipeline: submitted → reviewing → shortlisted → interview → test →
/// offered → accepted, one stage at a time. Rejected and withdrawn are
/// reachable from every non-terminal state.
pub fn application_transition_allowed(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    use ApplicationStatus::*;
    if application_terminal(from) {
        return false;
    }
    match to {
        Rejected | Withdrawn => true,
        _ => matches!(
            (from, to),
            (Submitted, Reviewing)
                | (Reviewing, Shortlisted)
                | (Shortlisted, Interview)
                | (Interview, Test)
                | (Test, Offered)
                | (Offered, Accepted)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;
    use CareerStatus::*;

    #[test]
    fn test_career_happy_path() {
        assert!(career_transition_allowed(Draft, Active));
        assert!(career_transition_allowed(Active, Closed));
        assert!(career_transition_allowed(Closed, Archived));
    }

    #[test]
    fn test_career_reopen() {
        assert!(career_transition_allowed(Closed, Active));
    }

    #[test]
    fn test_career_forbidden_edges() {
        assert!(!career_transition_allowed(Draft, Closed));
        assert!(!career_transition_allowed(Draft, Archived));
        assert!(!career_transition_allowed(Active, Archived));
        assert!(!career_transition_allowed(Active, Draft));
        assert!(!career_transition_allowed(Archived, Active));
        assert!(!career_transition_allowed(Archived, Closed));
    }

    #[test]
    fn test_career_no_self_transition() {
        for s in [Draft, Active, Closed, Archived] {
            assert!(!career_transition_allowed(s, s));
        }
    }

    #[test]
    fn test_publish_date_stamped_once() {
        assert!(stamps_publish_date(Active, None));
        assert!(!stamps_publish_date(Active, Some(Utc::now())));
        assert!(!stamps_publish_date(Closed, None));
    }

    #[test]
    fn test_application_pipeline_in_order() {
        assert!(application_transition_allowed(Submitted, Reviewing));
        assert!(application_transition_allowed(Reviewing, Shortlisted));
        assert!(application_transition_allowed(Shortlisted, Interview));
        assert!(application_transition_allowed(Interview, Test));
        assert!(application_transition_allowed(Test, Offered));
        assert!(application_transition_allowed(Offered, Accepted));
    }

    #[test]
    fn test_application_no_stage_skipping() {
        assert!(!application_transition_allowed(Submitted, Shortlisted));
        assert!(!application_transition_allowed(Reviewing, Interview));
        assert!(!application_transition_allowed(Submitted, Accepted));
    }

    #[test]
    fn test_rejection_and_withdrawal_from_any_live_state() {
        for from in [Submitted, Reviewing, Shortlisted, Interview, Test, Offered] {
            assert!(application_transition_allowed(from, Rejected));
            assert!(application_transition_allowed(from, Withdrawn));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [Accepted, Rejected, Withdrawn] {
            for to in [Submitted, Reviewing, Shortlisted, Interview, Test, Offered, Accepted] {
                assert!(!application_transition_allowed(from, to));
            }
        }
    }
}
