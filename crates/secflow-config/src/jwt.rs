use std::env;

use crate::app::ConfigError;

/// Signing configuration for access and refresh tokens.
///
/// Lifetimes are in seconds.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
            access_token_expiry: 1800,    // 30 minutes
            refresh_token_expiry: 604800, // 7 days
        }
    }
}

impl JwtConfig {
    /// Loads the signing configuration.
    ///
    /// `JWT_SECRET` has no default: an empty secret is rejected when the
    /// token service is constructed. Lifetimes must be whole, positive
    /// numbers of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            secret: env::var("JWT_SECRET").unwrap_or_default(),
            algorithm: env::var("JWT_ALGORITHM")
                .map(|a| a.trim().to_ascii_uppercase())
                .unwrap_or(defaults.algorithm),
            access_token_expiry: crate::env_parse(
                "JWT_ACCESS_EXPIRY",
                defaults.access_token_expiry,
            )?,
            refresh_token_expiry: crate::env_parse(
                "JWT_REFRESH_EXPIRY",
                defaults.refresh_token_expiry,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ACCESS_EXPIRY",
                value: self.access_token_expiry.to_string(),
            });
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_REFRESH_EXPIRY",
                value: self.refresh_token_expiry.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes_are_valid() {
        assert!(JwtConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_lifetimes() {
        let config = JwtConfig {
            access_token_expiry: 0,
            ..JwtConfig::default()
        };
        assert!(config.validate().is_err());

        let config = JwtConfig {
            refresh_token_expiry: -60,
            ..JwtConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
