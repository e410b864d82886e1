use std::time::Duration;

use async_trait::async_trait;

/// Error type for token store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Revocable record of issued refresh tokens, keyed by subject and token id.
///
/// A refresh token is only honoured while its entry exists. Entries expire on
/// their own after the token's lifetime.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    async fn save_refresh_token(
        &self,
        subject: &str,
        jti: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn contains_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError>;

    /// Returns whether an entry was removed.
    async fn remove_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError>;

    /// Removes every refresh token of `subject`, returning how many were removed.
    async fn remove_all_for_subject(&self, subject: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Drops lapsed entries, returning how many. Backends with native key
    /// expiry have nothing to do.
    fn evict_expired(&self) -> usize {
        0
    }

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
