//! Infrastructure layer for Chatly.
//!
//! Contains implementations of the traits defined in `chatly-core`:
//! SQLite storage for users and the token blacklist, an in-memory blacklist,
//! Argon2id password hashing, HMAC-signed session tokens, the Gemini
//! completion client, and server configuration loading.

pub mod blacklist;
pub mod config;
pub mod crypto;
pub mod llm;
pub mod memory;
pub mod sqlite;
