//! Fixed-window request counters.
//!
//! [`FixedWindowCounter`] shares counts through Redis: each (scope, client,
//! window) gets its own key and `INCR` is atomic, so concurrent requests from
//! many instances never undercount. [`LocalWindowCounter`] keeps the same
//! epoch-aligned windows in process memory.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tracing::instrument;

use crate::keys::KeySpace;
use crate::redis_store::RedisConnection;
use crate::store::StoreError;

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Requests seen in the current window, including this one.
    pub count: u64,
    /// Time until the current window closes.
    pub resets_in: Duration,
}

#[derive(Clone, Debug)]
pub struct FixedWindowCounter {
    conn: RedisConnection,
    keys: KeySpace,
}

impl FixedWindowCounter {
    pub fn new(conn: RedisConnection, keys: KeySpace) -> Self {
        Self { conn, keys }
    }

    /// Counts a request from `client` in `scope` and reports the running
    /// total for the current window.
    #[instrument(skip(self), fields(store.operation = "INCR"))]
    pub async fn hit(
        &self,
        scope: &str,
        client: &str,
        window: Duration,
    ) -> Result<WindowHit, StoreError> {
        let (index, resets_in) = window_position(SystemTime::now(), window);
        let key = self.keys.rate_limit(scope, client, index);
        let mut conn = self.conn.manager();

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&key, 1u64)
            .expire(&key, window.as_secs().max(1) as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(WindowHit { count, resets_in })
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    index: u64,
    count: u64,
    closes_at: SystemTime,
}

/// In-process fixed-window counter. A client's count only goes back to zero
/// when its window closes.
#[derive(Debug, Default)]
pub struct LocalWindowCounter {
    slots: DashMap<String, WindowSlot>,
}

impl LocalWindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self, scope: &str, client: &str, window: Duration) -> WindowHit {
        self.hit_at(SystemTime::now(), scope, client, window)
    }

    /// Counts a request made at `now`.
    pub fn hit_at(
        &self,
        now: SystemTime,
        scope: &str,
        client: &str,
        window: Duration,
    ) -> WindowHit {
        let (index, resets_in) = window_position(now, window);
        let fresh = WindowSlot {
            index,
            count: 0,
            closes_at: now + resets_in,
        };

        // The entry guard holds the shard lock for the read-modify-write.
        let mut slot = self
            .slots
            .entry(format!("{}:{}", scope, client))
            .or_insert(fresh);
        if slot.index != index {
            *slot = fresh;
        }
        slot.count += 1;

        WindowHit {
            count: slot.count,
            resets_in,
        }
    }

    /// Drops counters whose window closed before `now`.
    pub fn purge_closed(&self, now: SystemTime) {
        self.slots.retain(|_, slot| slot.closes_at > now);
        self.slots.shrink_to_fit();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Index of the window containing `now` and the time left in it.
pub fn window_position(now: SystemTime, window: Duration) -> (u64, Duration) {
    let window_secs = window.as_secs().max(1);
    let elapsed = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let index = elapsed / window_secs;
    let resets_in = Duration::from_secs(window_secs - elapsed % window_secs);
    (index, resets_in)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_position() {
        let now = UNIX_EPOCH + Duration::from_secs(125);
        let (index, resets_in) = window_position(now, Duration::from_secs(60));
        assert_eq!(index, 2);
        assert_eq!(resets_in, Duration::from_secs(55));
    }

    #[test]
    fn test_window_boundary_starts_new_window() {
        let now = UNIX_EPOCH + Duration::from_secs(120);
        let (index, resets_in) = window_position(now, Duration::from_secs(60));
        assert_eq!(index, 2);
        assert_eq!(resets_in, Duration::from_secs(60));
    }

    #[test]
    fn test_local_counter_holds_until_window_closes() {
        let counter = LocalWindowCounter::new();
        let window = Duration::from_secs(60);
        let start = UNIX_EPOCH + Duration::from_secs(600);

        for n in 1..=3 {
            assert_eq!(counter.hit_at(start, "general", "ip:a", window).count, n);
        }

        // Late in the same window the count keeps climbing
        for offset in [1, 30, 59] {
            let now = start + Duration::from_secs(offset);
            let hit = counter.hit_at(now, "general", "ip:a", window);
            assert!(hit.count > 3);
            assert_eq!(hit.resets_in, Duration::from_secs(60 - offset));
        }

        let next = counter.hit_at(start + window, "general", "ip:a", window);
        assert_eq!(next.count, 1);
        assert_eq!(next.resets_in, window);
    }

    #[test]
    fn test_local_counter_keys_by_scope_and_client() {
        let counter = LocalWindowCounter::new();
        let window = Duration::from_secs(60);
        let now = UNIX_EPOCH + Duration::from_secs(600);

        counter.hit_at(now, "general", "ip:a", window);
        assert_eq!(counter.hit_at(now, "general", "ip:b", window).count, 1);
        assert_eq!(counter.hit_at(now, "auth", "ip:a", window).count, 1);
        assert_eq!(counter.hit_at(now, "general", "ip:a", window).count, 2);
    }

    #[test]
    fn test_local_counter_purges_closed_windows() {
        let counter = LocalWindowCounter::new();
        let now = UNIX_EPOCH + Duration::from_secs(600);

        counter.hit_at(now, "general", "ip:a", Duration::from_secs(60));
        counter.hit_at(now, "auth", "ip:a", Duration::from_secs(300));
        assert_eq!(counter.len(), 2);

        counter.purge_closed(now + Duration::from_secs(60));
        assert_eq!(counter.len(), 1);

        counter.purge_closed(now + Duration::from_secs(300));
        assert!(counter.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_hit_counts_within_window() {
        let conn = RedisConnection::connect("redis://localhost:6379")
            .await
            .unwrap();
        let counter = FixedWindowCounter::new(conn, KeySpace::new("secflow-test"));
        let client = format!("client-{}", std::process::id());

        let first = counter
            .hit("general", &client, Duration::from_secs(60))
            .await
            .unwrap();
        let second = counter
            .hit("general", &client, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(second.count, first.count + 1);
    }
}
