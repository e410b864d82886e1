use std::env;

use crate::app::ConfigError;

/// HTTP listener and bootstrap settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seed the `admin` and `user` demo accounts at startup.
    pub seed_default_users: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            seed_default_users: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: crate::env_parse("PORT", defaults.port)?,
            seed_default_users: crate::env_flag("SEED_DEFAULT_USERS", defaults.seed_default_users)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
