use thiserror::Error;

use crate::{
    CorsConfig, JwtConfig, LoggingConfig, PasswordPolicy, RateLimitConfig, ServerConfig,
    StoreConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Every configuration section, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    pub password: PasswordPolicy,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads every section. The first value that is set but invalid fails
    /// the whole load.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env()?,
            store: StoreConfig::from_env()?,
            password: PasswordPolicy::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_consistent() {
        let config = AppConfig::default();
        assert!(config.rate_limit.validate().is_ok());
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert!(config.password.min_length <= config.password.max_length);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "TOKEN_STORE",
            value: "etcd".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value \"etcd\" for TOKEN_STORE");
    }
}
