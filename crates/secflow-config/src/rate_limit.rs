//! Rate limiting configuration.
//!
//! Two ceilings are configured: a general one applied to every route and a
//! stricter one for `/auth/*` endpoints, which are the brute-force target.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: Turn the limiter on or off (default: true)
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests allowed per window (default: 100)
//! - `RATE_LIMIT_WINDOW_SECONDS`: Window length in seconds (default: 60)
//! - `RATE_LIMIT_AUTH_MAX_REQUESTS`: Requests per window on `/auth/*` (default: 10)
//! - `RATE_LIMIT_AUTH_WINDOW_SECONDS`: Window length on `/auth/*` (default: 60)
//! - `RATE_LIMIT_BACKEND`: `local` or `redis` (default: local)
//! - `RATE_LIMIT_KEY`: `address` or `principal` (default: address)
//!
//! # Example
//!
//! ```ignore
//! use secflow_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env()?;
//! assert!(config.auth_max_requests <= config.max_requests);
//! ```

use std::str::FromStr;
use std::time::Duration;

use crate::app::ConfigError;

/// Where request counters live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// In-process fixed-window counters. Counts are per instance.
    Local,
    /// Fixed-window counters in Redis, shared by every instance.
    Redis,
}

impl FromStr for RateLimitBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// What identifies a client for counting purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitKey {
    /// Client network address.
    Address,
    /// Subject of a valid bearer token, falling back to the address.
    Principal,
}

impl FromStr for RateLimitKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "address" | "ip" => Ok(Self::Address),
            "principal" | "subject" => Ok(Self::Principal),
            other => Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_KEY",
                value: other.to_string(),
            }),
        }
    }
}

/// Rate limit configuration for the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests allowed per client within `window` on general routes.
    pub max_requests: u32,

    /// Length of the counting window on general routes.
    pub window: Duration,

    /// Requests allowed per client within `auth_window` on `/auth/*`.
    pub auth_max_requests: u32,

    pub auth_window: Duration,

    pub backend: RateLimitBackend,

    pub key: RateLimitKey,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window: Duration::from_secs(60),
            auth_max_requests: 10,
            auth_window: Duration::from_secs(60),
            backend: RateLimitBackend::Local,
            key: RateLimitKey::Address,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Unset values fall back to their defaults. A value that does not
    /// parse is an error, as is a zero ceiling or window.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match std::env::var("RATE_LIMIT_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.backend,
        };
        let key = match std::env::var("RATE_LIMIT_KEY") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.key,
        };

        let config = Self {
            enabled: crate::env_flag("RATE_LIMIT_ENABLED", defaults.enabled)?,
            max_requests: crate::env_parse("RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?,
            window: Duration::from_secs(crate::env_parse(
                "RATE_LIMIT_WINDOW_SECONDS",
                defaults.window.as_secs(),
            )?),
            auth_max_requests: crate::env_parse(
                "RATE_LIMIT_AUTH_MAX_REQUESTS",
                defaults.auth_max_requests,
            )?,
            auth_window: Duration::from_secs(crate::env_parse(
                "RATE_LIMIT_AUTH_WINDOW_SECONDS",
                defaults.auth_window.as_secs(),
            )?),
            backend,
            key,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 || self.auth_max_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_MAX_REQUESTS",
                value: "0".to_string(),
            });
        }
        if self.window.is_zero() || self.auth_window.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_WINDOW_SECONDS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
