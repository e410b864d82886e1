//! Per-client request ceilings.
//!
//! Two scopes are counted separately: `/auth/*` with its own stricter ceiling,
//! and everything else. Both backends count in fixed windows aligned to the
//! epoch. Once a client passes its ceiling every further request is refused
//! until the window closes. The local backend keeps counters in a `DashMap`;
//! the Redis backend is shared by every instance, and if Redis fails the
//! request is let through and a warning logged.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use secflow_cache::{FixedWindowCounter, LocalWindowCounter, WindowHit};
use secflow_config::{ConfigError, RateLimitConfig, RateLimitKey};
use secflow_core::AppError;
use tracing::warn;

use crate::middleware::auth::bearer_token;
use crate::state::AppState;

/// Which ceiling a request counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    General,
    Auth,
}

impl Scope {
    pub fn for_path(path: &str) -> Self {
        if path == "/auth" || path.starts_with("/auth/") {
            Scope::Auth
        } else {
            Scope::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::General => "general",
            Scope::Auth => "auth",
        }
    }
}

enum Backend {
    Local(LocalWindowCounter),
    Redis(FixedWindowCounter),
}

pub struct RateLimiter {
    config: RateLimitConfig,
    backend: Backend,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl RateLimiter {
    /// In-process limiter. Counters are not shared between instances.
    pub fn local(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            backend: Backend::Local(LocalWindowCounter::new()),
            config: config.clone(),
        })
    }

    /// Limiter backed by Redis fixed-window counters.
    pub fn redis(config: &RateLimitConfig, counter: FixedWindowCounter) -> Self {
        Self {
            backend: Backend::Redis(counter),
            config: config.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn key_mode(&self) -> RateLimitKey {
        self.config.key
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Local(_) => "local",
            Backend::Redis(_) => "redis",
        }
    }

    /// Counts one request from `client` and fails with 429 once the ceiling
    /// for `scope` is exceeded.
    pub async fn check(&self, scope: Scope, client: &str) -> Result<(), AppError> {
        let (max_requests, window) = self.ceiling(scope);

        let hit = match &self.backend {
            Backend::Local(counter) => counter.hit(scope.as_str(), client, window),
            Backend::Redis(counter) => match counter.hit(scope.as_str(), client, window).await {
                Ok(hit) => hit,
                Err(e) => {
                    warn!(error = %e, scope = scope.as_str(), "Rate limit counter unavailable, allowing request");
                    return Ok(());
                }
            },
        };

        self.admit(scope, client, max_requests, hit)
    }

    /// Same as [`check`](Self::check) for the local backend, counting the
    /// request as made at `now`. The Redis backend always uses its own clock.
    pub async fn check_at(
        &self,
        now: SystemTime,
        scope: Scope,
        client: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Local(counter) => {
                let (max_requests, window) = self.ceiling(scope);
                let hit = counter.hit_at(now, scope.as_str(), client, window);
                self.admit(scope, client, max_requests, hit)
            }
            Backend::Redis(_) => self.check(scope, client).await,
        }
    }

    fn ceiling(&self, scope: Scope) -> (u32, Duration) {
        match scope {
            Scope::General => (self.config.max_requests, self.config.window),
            Scope::Auth => (self.config.auth_max_requests, self.config.auth_window),
        }
    }

    fn admit(
        &self,
        scope: Scope,
        client: &str,
        max_requests: u32,
        hit: WindowHit,
    ) -> Result<(), AppError> {
        if hit.count > u64::from(max_requests) {
            return Err(self.reject(scope, client, hit.resets_in.as_secs().max(1)));
        }
        Ok(())
    }

    fn reject(&self, scope: Scope, client: &str, retry_after: u64) -> AppError {
        warn!(
            client = %client,
            scope = scope.as_str(),
            retry_after,
            "Rate limit exceeded"
        );
        crate::metrics::track_rate_limited(scope.as_str());
        AppError::too_many_requests(retry_after)
    }

    /// Drops local counters whose window has closed. No-op for Redis, whose
    /// keys expire on their own.
    pub fn purge(&self) {
        if let Backend::Local(counter) = &self.backend {
            counter.purge_closed(SystemTime::now());
        }
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn client_key(req: &Request, state: &AppState) -> String {
    if state.rate_limiter.key_mode() == RateLimitKey::Principal {
        let subject = bearer_token(req.headers())
            .ok()
            .and_then(|token| state.tokens.verify_access_token(token).ok())
            .map(|principal| principal.subject_id);

        if let Some(subject) = subject {
            return format!("sub:{}", subject);
        }
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    format!("ip:{}", client_address(req.headers(), peer))
}

/// Middleware enforcing the per-client ceilings.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.rate_limiter.enabled() {
        return Ok(next.run(req).await);
    }

    let scope = Scope::for_path(req.uri().path());
    let client = client_key(&req, &state);

    state.rate_limiter.check(scope, &client).await?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use std::time::{Duration, UNIX_EPOCH};

    fn limiter(max_requests: u32, auth_max_requests: u32) -> RateLimiter {
        RateLimiter::local(&RateLimitConfig {
            max_requests,
            auth_max_requests,
            window: Duration::from_secs(60),
            auth_window: Duration::from_secs(60),
            ..RateLimitConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_scope_for_path() {
        assert_eq!(Scope::for_path("/auth/login"), Scope::Auth);
        assert_eq!(Scope::for_path("/auth"), Scope::Auth);
        assert_eq!(Scope::for_path("/authors"), Scope::General);
        assert_eq!(Scope::for_path("/protected/me"), Scope::General);
    }

    #[tokio::test]
    async fn test_ceiling_then_reject() {
        let limiter = limiter(3, 3);

        for _ in 0..3 {
            assert!(limiter.check(Scope::General, "ip:1.1.1.1").await.is_ok());
        }

        let err = limiter
            .check(Scope::General, "ip:1.1.1.1")
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert!(err.retry_after.unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_rejected_until_window_closes() {
        let limiter = limiter(2, 2);
        let start = UNIX_EPOCH + Duration::from_secs(6_000);

        for _ in 0..2 {
            assert!(limiter.check_at(start, Scope::General, "ip:a").await.is_ok());
        }

        // Every further request in the window is refused, however late
        for offset in [0, 1, 10, 30, 45, 59] {
            let err = limiter
                .check_at(start + Duration::from_secs(offset), Scope::General, "ip:a")
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(err.retry_after, Some(60 - offset));
        }

        let next_window = start + Duration::from_secs(60);
        assert!(limiter.check_at(next_window, Scope::General, "ip:a").await.is_ok());
        assert!(limiter.check_at(next_window, Scope::General, "ip:a").await.is_ok());
        assert!(limiter.check_at(next_window, Scope::General, "ip:a").await.is_err());
    }

    #[tokio::test]
    async fn test_ceiling_is_per_window_not_per_refill() {
        let limiter = limiter(4, 4);
        let start = UNIX_EPOCH + Duration::from_secs(6_000);

        // Spread across one window, only the ceiling gets through
        let mut admitted = 0;
        for second in 0..60 {
            let now = start + Duration::from_secs(second);
            if limiter.check_at(now, Scope::General, "ip:a").await.is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 4);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = limiter(1, 1);

        assert!(limiter.check(Scope::General, "ip:a").await.is_ok());
        assert!(limiter.check(Scope::General, "ip:a").await.is_err());
        assert!(limiter.check(Scope::General, "ip:b").await.is_ok());
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let limiter = limiter(5, 1);

        assert!(limiter.check(Scope::Auth, "ip:a").await.is_ok());
        assert!(limiter.check(Scope::Auth, "ip:a").await.is_err());
        assert!(limiter.check(Scope::General, "ip:a").await.is_ok());
    }

    #[tokio::test]
    async fn test_purge_keeps_open_windows() {
        let limiter = limiter(1, 1);
        limiter.check(Scope::General, "ip:a").await.unwrap();
        limiter.purge();
        assert!(limiter.check(Scope::General, "ip:a").await.is_err());
    }

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_address(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_client_address_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_address(&headers, None), "198.51.100.2");

        let peer: SocketAddr = "192.0.2.1:5000".parse().unwrap();
        assert_eq!(client_address(&HeaderMap::new(), Some(peer)), "192.0.2.1");
        assert_eq!(client_address(&HeaderMap::new(), None), "unknown");
    }
}
