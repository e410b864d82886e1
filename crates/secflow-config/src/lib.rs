//! # SecFlow Config
//!
//! Configuration types for the SecFlow auth service.
//!
//! Every section is loaded from environment variables once at startup and
//! assembled into a single immutable [`AppConfig`]:
//!
//! - [`server`]: bind address and user seeding
//! - [`jwt`]: signing secret, algorithm and token lifetimes
//! - [`cors`]: allowed CORS origins
//! - [`rate_limit`]: per-client request ceilings
//! - [`store`]: refresh-token store backend and Redis URL
//! - [`password`]: password policy enforced at registration
//! - [`logging`]: log level, log directory and metrics toggle
//!
//! # Example
//!
//! ```ignore
//! use secflow_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod app;
pub mod cors;
pub mod jwt;
pub mod logging;
pub mod password;
pub mod rate_limit;
pub mod server;
pub mod store;

// Re-export commonly used types at crate root
pub use app::{AppConfig, ConfigError};
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use logging::LoggingConfig;
pub use password::{MAX_PASSWORD_BYTES, PasswordPolicy};
pub use rate_limit::{RateLimitBackend, RateLimitConfig, RateLimitKey};
pub use server::ServerConfig;
pub use store::{StoreConfig, TokenStoreKind};

/// Reads `key` and parses it. Unset or blank falls back to `default`; a value
/// that is set but does not parse is an error.
pub(crate) fn env_parse<T: std::str::FromStr>(
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}

/// Reads a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub(crate) fn env_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_flag(key, &raw),
        _ => Ok(default),
    }
}

pub(crate) fn parse_value<T: std::str::FromStr>(
    key: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

pub(crate) fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_trims() {
        assert_eq!(parse_value::<i64>("JWT_ACCESS_EXPIRY", " 900 ").unwrap(), 900);
    }

    #[test]
    fn test_parse_value_rejects_units_and_garbage() {
        let err = parse_value::<i64>("JWT_ACCESS_EXPIRY", "30m").unwrap_err();
        assert_eq!(err.to_string(), "invalid value \"30m\" for JWT_ACCESS_EXPIRY");

        assert!(parse_value::<u32>("RATE_LIMIT_MAX_REQUESTS", "-5").is_err());
        assert!(parse_value::<u16>("PORT", "70000").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("RATE_LIMIT_ENABLED", "Yes").unwrap());
        assert!(!parse_flag("RATE_LIMIT_ENABLED", "off").unwrap());
        assert!(parse_flag("RATE_LIMIT_ENABLED", "disabled").is_err());
    }

    #[test]
    fn test_unset_key_uses_default() {
        let key = "SECFLOW_CONFIG_TEST_UNSET_KEY";
        assert_eq!(env_parse(key, 42u32).unwrap(), 42);
        assert!(env_flag(key, true).unwrap());
    }
}
