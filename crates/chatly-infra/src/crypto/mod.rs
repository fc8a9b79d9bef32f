//! Cryptographic operations for Chatly.
//!
//! - `password`: Argon2id password hashing (PHC strings)
//! - `token`: HMAC-SHA256 signed session tokens

pub mod password;
pub mod token;
