use std::env;
use std::str::FromStr;

use crate::app::ConfigError;

/// Backend holding issued refresh tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStoreKind {
    Redis,
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "TOKEN_STORE",
                value: other.to_string(),
            }),
        }
    }
}

/// Refresh-token store configuration.
///
/// # Environment Variables
///
/// - `TOKEN_STORE`: `redis` or `memory` (default: redis)
/// - `REDIS_URL`: Connection URL (default: redis://127.0.0.1:6379)
/// - `REDIS_KEY_PREFIX`: Namespace for every key (default: secflow)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: TokenStoreKind,
    pub redis_url: String,
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: TokenStoreKind::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "secflow".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let kind = match env::var("TOKEN_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.kind,
        };

        Ok(Self {
            kind,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("redis".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Redis);
        assert_eq!("Memory".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Memory);
        assert!("postgres".parse::<TokenStoreKind>().is_err());
    }

    #[test]
    fn test_default_store_is_redis() {
        let config = StoreConfig::default();
        assert_eq!(config.kind, TokenStoreKind::Redis);
        assert!(config.redis_url.starts_with("redis://"));
    }
}
