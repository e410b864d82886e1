use std::sync::Arc;

use anyhow::Context;
use secflow_auth::TokenService;
use secflow_cache::{
    FixedWindowCounter, KeySpace, MemoryTokenStore, RedisConnection, RedisTokenStore, TokenStore,
};
use secflow_config::{AppConfig, RateLimitBackend, TokenStoreKind};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::middleware::rate_limit::RateLimiter;
use crate::modules::auth::service::AuthService;
use crate::modules::users::UserRepository;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<UserRepository>,
    pub rate_limiter: Arc<RateLimiter>,
    /// bcrypt hash of a random secret, verified against when a login names an
    /// unknown user. Built on first use.
    pub login_decoy: Arc<OnceCell<String>>,
}

impl AppState {
    /// Assembles the state from already-built parts.
    ///
    /// # Errors
    ///
    /// Fails when the JWT configuration cannot sign tokens.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TokenStore>,
        rate_limiter: RateLimiter,
    ) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt, store).context("invalid JWT configuration")?;

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            users: Arc::new(UserRepository::new()),
            rate_limiter: Arc::new(rate_limiter),
            login_decoy: Arc::new(OnceCell::new()),
        })
    }
}

async fn connect_redis(config: &AppConfig) -> Option<RedisConnection> {
    let needed = config.store.kind == TokenStoreKind::Redis
        || config.rate_limit.backend == RateLimitBackend::Redis;
    if !needed {
        return None;
    }

    match RedisConnection::connect(&config.store.redis_url).await {
        Ok(conn) => {
            info!(url = %config.store.redis_url, "Connected to Redis");
            Some(conn)
        }
        Err(e) => {
            warn!(
                error = %e,
                url = %config.store.redis_url,
                "Redis unreachable, falling back to in-process token store and rate limiter"
            );
            None
        }
    }
}

/// Builds the shared state, connecting to Redis when configured.
///
/// Redis being down is not fatal: the token store and rate limiter fall back
/// to their in-process versions. An unusable JWT or rate limit configuration
/// is fatal.
pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let redis = connect_redis(&config).await;
    let keys = KeySpace::new(config.store.key_prefix.clone());

    let store: Arc<dyn TokenStore> = match (&config.store.kind, &redis) {
        (TokenStoreKind::Redis, Some(conn)) => {
            Arc::new(RedisTokenStore::new(conn.clone(), keys.clone()))
        }
        _ => Arc::new(MemoryTokenStore::with_keys(keys.clone())),
    };

    let rate_limiter = match (&config.rate_limit.backend, redis) {
        (RateLimitBackend::Redis, Some(conn)) => {
            RateLimiter::redis(&config.rate_limit, FixedWindowCounter::new(conn, keys))
        }
        _ => RateLimiter::local(&config.rate_limit).context("invalid rate limit configuration")?,
    };

    info!(
        token_store = store.backend(),
        rate_limiter = rate_limiter.backend_name(),
        "Backends selected"
    );

    let seed = config.server.seed_default_users;
    let state = AppState::new(config, store, rate_limiter)?;

    if seed {
        let created = AuthService::seed_default_users(&state)
            .await
            .map_err(|e| e.error)?;
        info!(created, "Default users seeded");
    }

    AuthService::login_decoy(&state)
        .await
        .map_err(|e| e.error)?;

    Ok(state)
}
