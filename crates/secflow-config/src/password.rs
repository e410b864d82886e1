use crate::app::ConfigError;

/// Longest password bcrypt hashes in full: its 72-byte key less the NUL
/// terminator.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Password rules enforced when an account is registered.
///
/// Whatever `max_length` says, a password longer than [`MAX_PASSWORD_BYTES`]
/// bytes is never accepted.
///
/// # Environment Variables
///
/// - `PASSWORD_MIN_LENGTH` (default: 8)
/// - `PASSWORD_MAX_LENGTH` in characters (default: 64)
/// - `PASSWORD_REQUIRE_UPPERCASE` (default: true)
/// - `PASSWORD_REQUIRE_LOWERCASE` (default: true)
/// - `PASSWORD_REQUIRE_DIGITS` (default: true)
/// - `PASSWORD_REQUIRE_SPECIAL` (default: true)
/// - `PASSWORD_HASH_COST`: bcrypt work factor (default: 12)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digits: bool,
    pub require_special: bool,
    pub hash_cost: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            require_uppercase: true,
            require_lowercase: true,
            require_digits: true,
            require_special: true,
            hash_cost: 12,
        }
    }
}

impl PasswordPolicy {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let policy = Self {
            min_length: crate::env_parse("PASSWORD_MIN_LENGTH", defaults.min_length)?,
            max_length: crate::env_parse("PASSWORD_MAX_LENGTH", defaults.max_length)?,
            require_uppercase: crate::env_flag(
                "PASSWORD_REQUIRE_UPPERCASE",
                defaults.require_uppercase,
            )?,
            require_lowercase: crate::env_flag(
                "PASSWORD_REQUIRE_LOWERCASE",
                defaults.require_lowercase,
            )?,
            require_digits: crate::env_flag("PASSWORD_REQUIRE_DIGITS", defaults.require_digits)?,
            require_special: crate::env_flag(
                "PASSWORD_REQUIRE_SPECIAL",
                defaults.require_special,
            )?,
            hash_cost: crate::env_parse("PASSWORD_HASH_COST", defaults.hash_cost)?,
        };

        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length == 0 || self.min_length > self.max_length {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_MIN_LENGTH",
                value: self.min_length.to_string(),
            });
        }
        if !(4..=31).contains(&self.hash_cost) {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_HASH_COST",
                value: self.hash_cost.to_string(),
            });
        }
        Ok(())
    }

    /// A policy that only bounds length, hashing at the minimum cost.
    /// Used by tests and tooling.
    pub fn relaxed() -> Self {
        Self {
            min_length: 1,
            hash_cost: 4,
            require_uppercase: false,
            require_lowercase: false,
            require_digits: false,
            require_special: false,
            ..Self::default()
        }
    }
}
