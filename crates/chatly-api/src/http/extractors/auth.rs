//! Session cookie authentication extractors.
//!
//! `AuthenticatedUser` rejects the request unless the `token` cookie holds a
//! valid, unrevoked session token. `SessionToken` never rejects; logout uses
//! it because logging out without a session is not an error.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chatly_types::identity::AuthenticatedIdentity;

use crate::http::cookie::session_token;
use crate::http::error::AppError;
use crate::state::AppState;

/// Identity behind a verified session cookie.
pub struct AuthenticatedUser {
    pub identity: AuthenticatedIdentity,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        let identity = state.auth_service.authenticate(token.as_deref()).await?;
        Ok(AuthenticatedUser { identity })
    }
}

/// Raw session token from the cookie, unverified.
pub struct SessionToken(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(session_token(&parts.headers)))
    }
}
