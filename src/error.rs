//! Error types for CloudBox
//!
//! All server-side errors are converted to `AppError`,
//! which implements `IntoResponse` and renders the
//! `{ "success": false, "message": ... }` envelope the dashboard expects.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Server-side failures (5xx) are logged with their detail and answered
/// with a generic message so nothing internal reaches the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed or expired bearer token (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Email/password pair did not match a local account (401)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Validation error (400)
    #[error("{0}")]
    Validation(String),

    /// Uniqueness conflict reported by the store (409)
    #[error("{0}")]
    Conflict(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error talking to an OAuth provider (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for the 404 every user lookup produces.
    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".to_string())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Validation(_) => "validation",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<JsonRejection> for AppError {
    /// Malformed, mistyped or non-JSON request bodies
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Client errors echo their message; server errors are replaced
    /// with a generic one. Handlers log the detail via [`report`].
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status();
        let error_type = self.error_type();

        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[error_type])
            .inc();

        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Log a handler failure with its context
///
/// Server-side failures are logged at error level with full detail,
/// client errors at debug.
pub fn report(context: &'static str, error: &AppError) {
    if error.status().is_server_error() {
        tracing::error!(%error, "{context} error");
    } else {
        tracing::debug!(%error, "{context} rejected");
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
