//! Redis-backed refresh-token store.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::keys::KeySpace;
use crate::store::{StoreError, TokenStore};

/// Shared, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisConnection {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection").finish_non_exhaustive()
    }
}

impl RedisConnection {
    /// Opens a connection and checks it with `PING`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Redis` if the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        let this = Self { conn };
        this.ping().await?;
        Ok(this)
    }

    pub(crate) fn manager(&self) -> ConnectionManager {
        self.conn.clone()
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.manager();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Refresh tokens as `SET EX` keys, one per (subject, jti).
#[derive(Clone, Debug)]
pub struct RedisTokenStore {
    conn: RedisConnection,
    keys: KeySpace,
}

impl RedisTokenStore {
    pub fn new(conn: RedisConnection, keys: KeySpace) -> Self {
        Self { conn, keys }
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    #[instrument(skip(self, jti), fields(store.operation = "SETEX"))]
    async fn save_refresh_token(
        &self,
        subject: &str,
        jti: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.manager();
        let key = self.keys.refresh_token(subject, jti);

        conn.set_ex::<_, _, ()>(&key, 1u8, ttl.as_secs().max(1))
            .await?;

        debug!(store.ttl_secs = %ttl.as_secs(), "Refresh token stored");

        Ok(())
    }

    #[instrument(skip(self, jti), fields(store.operation = "EXISTS"))]
    async fn contains_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.manager();
        let exists: bool = conn.exists(self.keys.refresh_token(subject, jti)).await?;
        Ok(exists)
    }

    #[instrument(skip(self, jti), fields(store.operation = "DEL"))]
    async fn remove_refresh_token(&self, subject: &str, jti: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.manager();
        let removed: u64 = conn.del(self.keys.refresh_token(subject, jti)).await?;
        Ok(removed > 0)
    }

    /// Uses SCAN rather than KEYS so large keyspaces are never blocked.
    #[instrument(skip(self), fields(store.operation = "SCAN_DEL"))]
    async fn remove_all_for_subject(&self, subject: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.manager();
        let pattern = self.keys.refresh_pattern(subject);
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(store.deleted = %deleted, "Subject refresh tokens removed");

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.conn.ping().await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a running Redis instance.

    async fn store() -> RedisTokenStore {
        let conn = RedisConnection::connect("redis://localhost:6379")
            .await
            .unwrap();
        RedisTokenStore::new(conn, KeySpace::new("secflow-test"))
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_save_contains_remove() {
        let store = store().await;

        store
            .save_refresh_token("u1", "jti-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.contains_refresh_token("u1", "jti-1").await.unwrap());

        assert!(store.remove_refresh_token("u1", "jti-1").await.unwrap());
        assert!(!store.contains_refresh_token("u1", "jti-1").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_remove_all_for_subject() {
        let store = store().await;
        let ttl = Duration::from_secs(60);

        store.save_refresh_token("u2", "a", ttl).await.unwrap();
        store.save_refresh_token("u2", "b", ttl).await.unwrap();
        store.save_refresh_token("u3", "c", ttl).await.unwrap();

        assert_eq!(store.remove_all_for_subject("u2").await.unwrap(), 2);
        assert!(store.contains_refresh_token("u3", "c").await.unwrap());

        store.remove_all_for_subject("u3").await.unwrap();
    }
}
