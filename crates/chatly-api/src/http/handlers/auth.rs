//! Authentication handlers: register, login, current user, logout.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use serde::Serialize;

use chatly_types::identity::{AuthenticatedIdentity, LoginRequest, RegisterRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::{AuthenticatedUser, SessionToken};
use crate::http::response::{ApiResponse, new_request_id};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub message: &'static str,
    pub user: AuthenticatedIdentity,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: &'static str,
}

/// POST /api/auth/register - Create an account and start a session.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    let Json(body) = body?;

    let session = state.auth_service.register(&body).await?;
    let cookie = state.cookie.session(&session.token.token);

    let resp = ApiResponse::success(
        UserPayload {
            message: "User registered successfully",
            user: session.identity,
        },
        new_request_id(),
        start.elapsed().as_millis() as u64,
    );
    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(resp)))
}

/// POST /api/auth/login - Sign in with username or email plus password.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    let Json(body) = body?;

    let session = state.auth_service.login(&body).await?;
    let cookie = state.cookie.session(&session.token.token);

    let resp = ApiResponse::success(
        UserPayload {
            message: "Logged in successfully",
            user: session.identity,
        },
        new_request_id(),
        start.elapsed().as_millis() as u64,
    );
    Ok(([(SET_COOKIE, cookie)], Json(resp)))
}

/// GET /api/auth/me - The identity behind the session cookie.
pub async fn me(user: AuthenticatedUser) -> Json<ApiResponse<UserPayload>> {
    Json(ApiResponse::success(
        UserPayload {
            message: "Current user fetched successfully",
            user: user.identity,
        },
        new_request_id(),
        0,
    ))
}

/// GET|POST /api/auth/logout - Revoke the session token and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, AppError> {
    let start = Instant::now();
    state.auth_service.logout(token.as_deref()).await?;

    let resp = ApiResponse::success(
        MessagePayload {
            message: "Logged out successfully",
        },
        new_request_id(),
        start.elapsed().as_millis() as u64,
    );
    Ok(([(SET_COOKIE, state.cookie.cleared())], Json(resp)))
}
