use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use thiserror::Error;

/// Replacement message for 500-status errors in production.
const REDACTED_INTERNAL_MESSAGE: &str = "Internal server error occurred.";

static PRODUCTION: Lazy<bool> =
    Lazy::new(|| std::env::var("APP_ENV").map(|v| v == "production").unwrap_or(false));

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authorization Error: token missing.")]
    TokenMissing,
    #[error("TokenExpiredError")]
    TokenExpired,
    #[error("Authorization Error: Failed to verify token.")]
    TokenInvalid,
    #[error("{0}")]
    Validation(String),
    /// Authentication failures on the login route.
    #[error("{0}")]
    Unauthorized(String),
    /// Duplicate-name and duplicate-account failures.
    #[error("{0}")]
    Conflict(String),
    /// Dashboard/source misses; id misses and ownership misses collapse here
    /// so non-owners cannot probe for existence.
    #[error("{0}")]
    NotFound(String),
    #[error("Resource Error: User not found.")]
    UserNotFound,
    // The leading space is part of the wire contract.
    #[error(" Resource Error: Reset token has expired.")]
    ResetExpired,
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Transport status line and the `status` field carried in the body.
    ///
    /// Business-rule failures ride an HTTP 200 with the real code embedded in
    /// the body; hard failures (auth, validation, uncaught) use the matching
    /// HTTP status line. Clients depend on this split.
    fn statuses(&self) -> (StatusCode, u16) {
        match self {
            AppError::TokenMissing => (StatusCode::FORBIDDEN, 403),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, 401),
            AppError::TokenInvalid => (StatusCode::FORBIDDEN, 403),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, 400),
            AppError::Unauthorized(_) => (StatusCode::OK, 401),
            AppError::Conflict(_) => (StatusCode::OK, 409),
            AppError::NotFound(_) => (StatusCode::OK, 409),
            AppError::UserNotFound => (StatusCode::OK, 404),
            AppError::ResetExpired => (StatusCode::OK, 410),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, 500),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, 500),
        }
    }
}

/// Hide internals behind a generic message when running in production.
fn present_message(message: String, body_status: u16, production: bool) -> String {
    if body_status == 500 && production {
        REDACTED_INTERNAL_MESSAGE.to_string()
    } else {
        message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body_status) = self.statuses();
        let message = self.to_string();
        if body_status == 500 {
            tracing::error!(error = %message, "request failed");
        }
        let message = present_message(message, body_status, *PRODUCTION);
        (
            status,
            Json(serde_json::json!({ "message": message, "status": body_status })),
        )
            .into_response()
    }
}
