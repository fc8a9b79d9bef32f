use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::session::ConnectionId;

/// A single failing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more input fields failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "validation failed: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Errors from registration, login and token checks.
///
/// Messages are deliberately generic: they never reveal which credential
/// field was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("username or email already exists")]
    Duplicate,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing session token")]
    MissingToken,

    #[error("invalid or expired session token")]
    InvalidToken,

    #[error("session token has been revoked")]
    Revoked,

    #[error("credential hashing failed")]
    Hashing,

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from repository operations (used by trait definitions in chatly-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the per-connection session machinery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} is not active yet")]
    NotActive(ConnectionId),

    #[error("session {0} is closed")]
    Closed(ConnectionId),
}

/// Errors decoding a provider wire turn.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown turn role: '{0}'")]
    UnknownRole(String),
}
