//! User repository trait definition.

use chatly_types::error::RepositoryError;
use chatly_types::identity::UserRecord;

/// Repository trait for user persistence.
///
/// Implementations live in chatly-infra (e.g., SqliteUserRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Returns `RepositoryError::Conflict` when the
    /// username or email is already taken.
    fn create(
        &self,
        user: &UserRecord,
    ) -> impl std::future::Future<Output = Result<UserRecord, RepositoryError>> + Send;

    /// Find a user whose username equals `username` or whose email equals
    /// `email`. `None` arguments never match.
    fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>, RepositoryError>> + Send;
}
