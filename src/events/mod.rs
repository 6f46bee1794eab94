//! Event handling module.
//!
//! This module contains the dashboard's network events:
//! - Network events: refreshes and notification updates against the API
//! - Refresh loop: the periodic dashboard refresh

pub mod network;
pub mod refresh;
