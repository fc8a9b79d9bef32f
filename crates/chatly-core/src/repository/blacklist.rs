//! Token blacklist trait.
//!
//! A key/value store with expiry holding tokens invalidated by logout.
//! An entry only needs to outlive the token it blocks.

use chatly_types::error::RepositoryError;
use chrono::{DateTime, Utc};

pub trait TokenBlacklist: Send + Sync {
    /// Mark `token` as revoked until `expires_at`.
    fn revoke(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Whether `token` is currently revoked. Expired entries do not count.
    fn is_revoked(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete expired entries. Returns how many were removed.
    fn purge_expired(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
