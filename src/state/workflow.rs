//! Complaint status workflow.
//!
//! The only legal status changes are:
//!
//! | from          | to                                  |
//! |---------------|-------------------------------------|
//! | `open`        | `in_progress`, `escalated`, `cancelled` |
//! | `in_progress` | `resolved`, `escalated`             |
//! | `escalated`   | `resolved`, `in_progress`           |
//! | `resolved`    | `closed`                            |
//! | `closed`      | none                                |
//! | `cancelled`   | none                                |
//!
//! `pending` has no outgoing edges either; complaints only reach it through
//! backend data.

use super::error::StateError;
use crate::api::resource::Status;

/// Statuses reachable from `from` in one step.
///
pub fn allowed_transitions(from: Status) -> &'static [Status] {
    match from {
        Status::Open => &[Status::InProgress, Status::Escalated, Status::Cancelled],
        Status::InProgress => &[Status::Resolved, Status::Escalated],
        Status::Escalated => &[Status::Resolved, Status::InProgress],
        Status::Resolved => &[Status::Closed],
        Status::Closed | Status::Cancelled | Status::Pending => &[],
    }
}

pub fn is_allowed(from: Status, to: Status) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Check a status change, returning a rejection that names the legal next
/// states. Keeping the current status is not a transition and is accepted.
///
pub fn check_transition(from: Status, to: Status) -> Result<(), StateError> {
    if from == to || is_allowed(from, to) {
        return Ok(());
    }
    Err(StateError::InvalidTransition {
        from,
        to,
        allowed: allowed_transitions(from).to_vec(),
    })
}

/// Terminal statuses have no outgoing transitions.
///
pub fn is_final(status: Status) -> bool {
    allowed_transitions(status).is_empty()
}
