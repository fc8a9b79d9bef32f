//! SQLite user repository implementation.

use chatly_core::repository::user::UserRepository;
use chatly_types::error::RepositoryError;
use chatly_types::identity::UserRecord;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<UserRecord, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        Ok(UserRecord {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_row(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<UserRecord>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row =
                UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(user_row.into_record()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &UserRecord) -> Result<UserRecord, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("user '{}' already exists", user.username)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        // NULL never compares equal, so an absent argument matches nothing
        let row = sqlx::query("SELECT * FROM users WHERE username = ? OR email = ? LIMIT 1")
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use chrono::{SubsecRound, Utc};

    fn make_user(username: &str, email: &str) -> UserRecord {
        UserRecord {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$stub".to_string(),
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("asha", "asha@example.com");

        repo.create(&user).await.unwrap();
        let fetched = repo
            .find_by_login(Some("asha"), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.username, "asha");
        assert_eq!(fetched.email, "asha@example.com");
        assert_eq!(fetched.password_hash, user.password_hash);
        assert_eq!(fetched.created_at, user.created_at);
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        assert!(
            repo.find_by_login(Some("nobody"), Some("nobody@example.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(&make_user("asha", "asha@example.com")).await.unwrap();

        let err = repo
            .create(&make_user("asha", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(&make_user("asha", "asha@example.com")).await.unwrap();

        let err = repo
            .create(&make_user("bilal", "asha@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_by_username_or_email() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("asha", "asha@example.com");
        repo.create(&user).await.unwrap();

        let by_name = repo.find_by_login(Some("asha"), None).await.unwrap().unwrap();
        let by_email = repo
            .find_by_login(None, Some("asha@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);

        assert!(repo.find_by_login(Some("nobody"), None).await.unwrap().is_none());
        assert!(repo.find_by_login(None, None).await.unwrap().is_none());
    }
}
