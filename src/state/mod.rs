//! Session state.
//!
//! This module holds everything that lives only for the current session:
//! - `ServiceMode`, whether the dispatcher still talks to the backend
//! - the complaint status workflow
//! - `DashboardState`, the metrics, notifications and analytics last fetched

mod dashboard;
mod error;
mod mode;
pub mod workflow;

pub use dashboard::DashboardState;
pub use error::StateError;
pub use mode::{DegradedReason, ServiceMode};
