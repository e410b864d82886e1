//! Process-local refresh-token store.
//!
//! Used when Redis is not configured or not reachable. Entries are lost on
//! restart and are not shared between instances.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::keys::KeySpace;
use crate::store::{StoreError, TokenStore};

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: DashMap<String, Instant>,
    keys: KeySpace,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: KeySpace) -> Self {
        Self {
            entries: DashMap::new(),
            keys,
        }
    }

    /// Drops entries whose lifetime has passed. Lookups already ignore them.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        self.entries.retain(|_, expires_at| {
            let live = *expires_at > now;
            if !live {
                purged += 1;
            }
            live
        });
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save_refresh_token(
        &self,
        subject: &str,
        jti: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.entries
            .insert(self.keys.refresh_token(subject, jti), Instant::now() + ttl);
        Ok(())
    }

    async fn contains_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError> {
        let key = self.keys.refresh_token(subject, jti);
        let live = match self.entries.get(&key) {
            Some(expires_at) => *expires_at > Instant::now(),
            None => return Ok(false),
        };
        if !live {
            self.entries.remove(&key);
        }
        Ok(live)
    }

    async fn remove_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError> {
        Ok(self
            .entries
            .remove(&self.keys.refresh_token(subject, jti))
            .is_some())
    }

    async fn remove_all_for_subject(&self, subject: &str) -> Result<u64, StoreError> {
        let prefix = self.keys.refresh_prefix(subject);
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.starts_with(&prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn evict_expired(&self) -> usize {
        self.purge_expired()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
