//! SQLite token blacklist.
//!
//! Tokens are stored as their SHA-256 hex digest, never in plain text.
//! Expiry is checked at read time; `purge_expired` reclaims space.

use chatly_core::repository::blacklist::TokenBlacklist;
use chatly_types::error::RepositoryError;
use chrono::{DateTime, Utc};

use super::format_datetime;
use super::pool::DatabasePool;
use crate::crypto::token::token_digest;

pub struct SqliteTokenBlacklist {
    pool: DatabasePool,
}

impl SqliteTokenBlacklist {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl TokenBlacklist for SqliteTokenBlacklist {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO token_blacklist (token_hash, expires_at) VALUES (?, ?)
               ON CONFLICT (token_hash) DO UPDATE SET expires_at = excluded.expires_at"#,
        )
        .bind(token_digest(token))
        .bind(format_datetime(&expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RepositoryError> {
        // RFC 3339 strings in UTC sort chronologically
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM token_blacklist WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(token_digest(token))
        .bind(format_datetime(&Utc::now()))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= ?")
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoked_token_is_reported() {
        let blacklist = SqliteTokenBlacklist::new(test_pool().await);
        assert!(!blacklist.is_revoked("tok-a").await.unwrap());

        blacklist
            .revoke("tok-a", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(blacklist.is_revoked("tok-a").await.unwrap());
        assert!(!blacklist.is_revoked("tok-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_token_is_stored_hashed() {
        let pool = test_pool().await;
        let blacklist = SqliteTokenBlacklist::new(pool.clone());
        blacklist
            .revoke("secret-token", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let (stored,): (String,) = sqlx::query_as("SELECT token_hash FROM token_blacklist")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_ne!(stored, "secret-token");
        assert_eq!(stored.len(), 64);
    }

    #[tokio::test]
    async fn test_expired_entry_is_ignored_and_purged() {
        let blacklist = SqliteTokenBlacklist::new(test_pool().await);
        blacklist
            .revoke("old", Utc::now() - Duration::seconds(5))
            .await
            .unwrap();
        blacklist
            .revoke("fresh", Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(!blacklist.is_revoked("old").await.unwrap());
        assert_eq!(blacklist.purge_expired().await.unwrap(), 1);
        assert!(blacklist.is_revoked("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_twice_is_idempotent() {
        let blacklist = SqliteTokenBlacklist::new(test_pool().await);
        let exp = Utc::now() + Duration::hours(1);
        blacklist.revoke("tok", exp).await.unwrap();
        blacklist.revoke("tok", exp).await.unwrap();
        assert!(blacklist.is_revoked("tok").await.unwrap());
    }
}
