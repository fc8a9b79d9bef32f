//! Token blacklist backend selection.

use chatly_core::repository::blacklist::TokenBlacklist;
use chatly_types::config::BlacklistBackend;
use chatly_types::error::RepositoryError;
use chrono::{DateTime, Utc};

use crate::memory::blacklist::MemoryTokenBlacklist;
use crate::sqlite::blacklist::SqliteTokenBlacklist;
use crate::sqlite::pool::DatabasePool;

/// Token blacklist chosen at startup from `ServerConfig::blacklist`.
pub enum ConfiguredBlacklist {
    Sqlite(SqliteTokenBlacklist),
    Memory(MemoryTokenBlacklist),
}

impl ConfiguredBlacklist {
    pub fn new(backend: BlacklistBackend, pool: &DatabasePool) -> Self {
        match backend {
            BlacklistBackend::Sqlite => Self::Sqlite(SqliteTokenBlacklist::new(pool.clone())),
            BlacklistBackend::Memory => Self::Memory(MemoryTokenBlacklist::new()),
        }
    }
}

impl TokenBlacklist for ConfiguredBlacklist {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(b) => b.revoke(token, expires_at).await,
            Self::Memory(b) => b.revoke(token, expires_at).await,
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RepositoryError> {
        match self {
            Self::Sqlite(b) => b.is_revoked(token).await,
            Self::Memory(b) => b.is_revoked(token).await,
        }
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        match self {
            Self::Sqlite(b) => b.purge_expired().await,
            Self::Memory(b) => b.purge_expired().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_configured_backends_behave_alike() {
        let pool = test_pool().await;
        for backend in [BlacklistBackend::Sqlite, BlacklistBackend::Memory] {
            let blacklist = ConfiguredBlacklist::new(backend, &pool);
            let token = format!("tok-{backend:?}");
            blacklist
                .revoke(&token, Utc::now() + Duration::minutes(5))
                .await
                .unwrap();
            assert!(blacklist.is_revoked(&token).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_memory_backend_does_not_touch_database() {
        let pool = test_pool().await;
        let blacklist = ConfiguredBlacklist::new(BlacklistBackend::Memory, &pool);
        blacklist
            .revoke("tok", Utc::now() + Duration::minutes(5))
            .await
            .unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM token_blacklist")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
