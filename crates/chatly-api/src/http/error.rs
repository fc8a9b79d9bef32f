//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Authentication failures carry fixed, generic messages so a response never
//! tells which credential was wrong.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use chatly_types::error::AuthError;

use super::response::{ApiResponse, new_request_id};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Registration, login or token failures.
    Auth(AuthError),
    /// Request body could not be parsed.
    BadRequest(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Auth(AuthError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                serde_json::to_value(&errors.errors).ok(),
            ),
            AppError::Auth(AuthError::Duplicate) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                "Username or email already exists".to_string(),
                None,
            ),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
                None,
            ),
            AppError::Auth(AuthError::MissingToken) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Not authenticated".to_string(),
                None,
            ),
            AppError::Auth(AuthError::InvalidToken | AuthError::Revoked) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or expired session".to_string(),
                None,
            ),
            AppError::Auth(AuthError::Hashing | AuthError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse::error(code, &message, details, new_request_id());
        (status, Json(body)).into_response()
    }
}
