//! Shared helpers for text cells and timestamps.

pub mod datetime;
pub mod text_processing;
