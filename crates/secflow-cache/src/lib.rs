//! # SecFlow Cache
//!
//! Storage for revocable refresh tokens and shared rate-limit counters.
//!
//! This crate provides:
//! - The [`TokenStore`] trait the token service records refresh tokens in
//! - [`RedisTokenStore`], shared across instances
//! - [`MemoryTokenStore`], a process-local fallback
//! - [`FixedWindowCounter`], Redis-backed request counters
//! - [`LocalWindowCounter`], the same windows kept in process memory
//! - Key generation under a configurable namespace
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use secflow_cache::{KeySpace, RedisConnection, RedisTokenStore, TokenStore};
//!
//! let conn = RedisConnection::connect("redis://127.0.0.1:6379").await?;
//! let store: Arc<dyn TokenStore> = Arc::new(RedisTokenStore::new(conn, KeySpace::new("secflow")));
//! store.save_refresh_token("user-id", "jti", Duration::from_secs(60)).await?;
//! ```

pub mod counter;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use counter::{FixedWindowCounter, LocalWindowCounter, WindowHit, window_position};
pub use keys::KeySpace;
pub use memory::MemoryTokenStore;
pub use redis_store::{RedisConnection, RedisTokenStore};
pub use store::{StoreError, TokenStore};
