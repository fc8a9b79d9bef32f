//! HTTP and WebSocket layer for Chatly.
//!
//! Axum-based REST auth API under `/api/auth/`, the chat WebSocket at `/ws`,
//! envelope response format and credentialed CORS for the web client.

pub mod cookie;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
