//! Application-wide error types.
//!
//! This module defines the main error type hierarchy for the application,
//! allowing for type-safe error handling throughout the codebase.

pub use crate::api::ApiError;
pub use crate::config::ConfigError;
pub use crate::proxy::ProxyError;
pub use crate::state::StateError;

/// Main application error type.
///
/// This is the top-level error type that encompasses all error types
/// in the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API errors that reach the caller
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// State management errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Proxy server errors
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger initialization errors
    #[error("Logger error: {0}")]
    Logger(String),
}

/// Convenience type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::resource::Status;

    #[test]
    fn test_app_error_from_config_error() {
        let config_error = ConfigError::FilePathNotSet;
        let app_error: AppError = config_error.into();
        assert!(matches!(app_error, AppError::Config(_)));
        assert!(app_error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let api_error = ApiError::Validation("Email and password are required".to_string());
        let app_error: AppError = api_error.into();
        assert!(matches!(app_error, AppError::Api(_)));
        assert_eq!(
            app_error.to_string(),
            "API error: Email and password are required"
        );
    }

    #[test]
    fn test_app_error_from_state_error() {
        let state_error = StateError::InvalidTransition {
            from: Status::Closed,
            to: Status::Open,
            allowed: vec![],
        };
        let app_error: AppError = state_error.into();
        assert!(matches!(app_error, AppError::State(_)));
        assert!(app_error.to_string().contains("final state"));
    }

    #[test]
    fn test_app_error_from_proxy_error() {
        let app_error: AppError = ProxyError::NoAction.into();
        assert!(matches!(app_error, AppError::Proxy(_)));
        assert_eq!(app_error.to_string(), "Proxy error: No action specified");
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Io(_)));
        assert!(app_error.to_string().contains("I/O error"));
    }
}
