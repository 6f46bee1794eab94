//! Backend API error types.

use crate::state::StateError;

/// Errors that can occur during backend API operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Invalid JSON response: {source}. Response body: {body}")]
    Decode {
        source: serde_json::Error,
        body: String,
    },

    /// Request payload could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Configured base URL cannot be parsed
    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// Caller supplied an incomplete or invalid request
    #[error("{0}")]
    Validation(String),

    /// Requested status change is not allowed by the workflow
    #[error(transparent)]
    Transition(#[from] StateError),
}
