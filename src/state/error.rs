//! State management-specific error types.

use crate::api::resource::Status;

/// Errors that can occur during state operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Status change rejected by the complaint workflow
    #[error(
        "Cannot change status from \"{from}\" to \"{to}\". Allowed transitions: {}",
        allowed_names(.allowed)
    )]
    InvalidTransition {
        from: Status,
        to: Status,
        allowed: Vec<Status>,
    },

    /// Notification not found in session state
    #[error("Notification not found: {id}")]
    NotificationNotFound { id: String },
}

fn allowed_names(allowed: &[Status]) -> String {
    if allowed.is_empty() {
        return "None (final state)".to_string();
    }
    allowed
        .iter()
        .map(Status::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_display() {
        let error = StateError::InvalidTransition {
            from: Status::Resolved,
            to: Status::Open,
            allowed: vec![Status::Closed],
        };
        assert_eq!(
            error.to_string(),
            "Cannot change status from \"resolved\" to \"open\". Allowed transitions: closed"
        );

        let error = StateError::InvalidTransition {
            from: Status::Closed,
            to: Status::Open,
            allowed: vec![],
        };
        assert!(error.to_string().contains("None (final state)"));

        let error = StateError::NotificationNotFound {
            id: "notif-3".to_string(),
        };
        assert!(error.to_string().contains("Notification not found"));
        assert!(error.to_string().contains("notif-3"));
    }
}
