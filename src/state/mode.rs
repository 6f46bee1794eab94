//! Whether the dispatcher talks to the live backend.

use std::fmt;

/// Why the dispatcher stopped using the backend.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegradedReason {
    /// Demo mode requested through configuration.
    Forced,
    /// Network failure or non-success HTTP status.
    Transport(String),
    /// The backend answered with something other than JSON.
    Decode(String),
}

/// Service mode for the current session. Once degraded, the dispatcher
/// answers from demo data until [`ServiceMode::Live`] is restored explicitly.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceMode {
    Live,
    Degraded(DegradedReason),
}

impl ServiceMode {
    pub fn is_live(&self) -> bool {
        matches!(self, ServiceMode::Live)
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_live()
    }
}

impl Default for ServiceMode {
    fn default() -> Self {
        ServiceMode::Live
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceMode::Live => write!(f, "live"),
            ServiceMode::Degraded(DegradedReason::Forced) => write!(f, "demo (forced)"),
            ServiceMode::Degraded(DegradedReason::Transport(message)) => {
                write!(f, "demo (backend unreachable: {})", message)
            }
            ServiceMode::Degraded(DegradedReason::Decode(message)) => {
                write!(f, "demo (invalid backend response: {})", message)
            }
        }
    }
}
