use std::env;

use crate::app::ConfigError;

/// Log output and metrics settings.
///
/// `LOG_LEVEL` is only the fallback filter; `RUST_LOG` wins when set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
    pub observability_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "storage/logs".to_string(),
            observability_enabled: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            level: env::var("LOG_LEVEL")
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or(defaults.level),
            dir: env::var("LOG_DIR").unwrap_or(defaults.dir),
            observability_enabled: crate::env_flag(
                "OBSERVABILITY_ENABLED",
                defaults.observability_enabled,
            )?,
        })
    }
}
