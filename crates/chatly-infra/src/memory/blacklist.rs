//! In-memory token blacklist backed by a `DashMap`.
//!
//! Entries vanish on restart, so a restart re-admits revoked tokens that have
//! not yet expired. Selected with `blacklist = "memory"`.

use chatly_core::repository::blacklist::TokenBlacklist;
use chatly_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::crypto::token::token_digest;

#[derive(Default)]
pub struct MemoryTokenBlacklist {
    entries: DashMap<String, DateTime<Utc>>,
}

impl MemoryTokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenBlacklist for MemoryTokenBlacklist {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.entries.insert(token_digest(token), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .entries
            .get(&token_digest(token))
            .is_some_and(|exp| *exp > Utc::now()))
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let now = Utc::now();
        // Counted inside retain: concurrent revokes change len() meanwhile
        let mut removed = 0u64;
        self.entries.retain(|_, exp| {
            let keep = *exp > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
