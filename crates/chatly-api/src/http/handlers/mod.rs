//! Route handlers.

pub mod auth;
pub mod ws;
