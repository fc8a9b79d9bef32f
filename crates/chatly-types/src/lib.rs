//! Shared domain types for Chatly.
//!
//! This crate contains the core domain types used across the Chatly server:
//! conversation turns and their wire form, session lifecycle states, user
//! identities, provider request types, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod session;
pub mod turn;
