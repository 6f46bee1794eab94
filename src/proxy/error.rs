use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Proxy error types
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("No action specified")]
    NoAction,

    #[error("Google Apps Script error: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid JSON response from Google Apps Script: {0}")]
    InvalidJson(String),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Failure on the development proxy's pass-through route.
    #[error("{0}")]
    Forward(String),

    #[error("Failed to bind proxy to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Proxy server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

impl ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NoAction => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ProxyError::NoAction => json!({
                "success": false,
                "error": "No action specified",
                "message": "Request must include an action parameter",
            }),
            ProxyError::Forward(error) => json!({
                "success": false,
                "message": "Proxy server error",
                "error": error,
            }),
            ProxyError::Bind { .. } | ProxyError::Serve(_) => json!({
                "success": false,
                "message": "Internal server error",
                "error": self.to_string(),
            }),
            ProxyError::UpstreamStatus { .. }
            | ProxyError::InvalidJson(_)
            | ProxyError::Request(_) => json!({
                "success": false,
                "error": "Proxy error",
                "details": self.to_string(),
                "message": "Failed to connect to backend service. Please check Google Apps Script deployment.",
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        };

        (status, Json(body)).into_response()
    }
}
