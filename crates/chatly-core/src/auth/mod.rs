//! Authentication: registration, login, logout and token checks.
//!
//! `AuthService` is generic over the storage, hashing and token ports
//! defined here and in [`crate::repository`]. Adapters live in chatly-infra.

pub mod service;
pub mod validation;

use chatly_types::error::AuthError;
use chatly_types::identity::{AuthenticatedIdentity, IssuedToken, TokenClaims};

/// Abstraction over password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a password into a self-describing string (salt included).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a password against a stored hash. Malformed hashes never verify.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Issues and verifies signed session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, identity: &AuthenticatedIdentity) -> Result<IssuedToken, AuthError>;

    /// Verify signature and expiry.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// How long issued tokens stay valid.
    fn validity(&self) -> chrono::Duration;
}
