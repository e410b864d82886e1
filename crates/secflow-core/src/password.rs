//! Password hashing and policy checks.
//!
//! Hashes are bcrypt with a per-hash random salt; `verify_password` relies on
//! bcrypt's constant-time comparison. bcrypt ignores input past its key size,
//! so passwords longer than [`MAX_PASSWORD_BYTES`] are refused outright
//! instead of being silently truncated.

use bcrypt::{DEFAULT_COST, non_truncating_hash, non_truncating_verify};
use secflow_config::{MAX_PASSWORD_BYTES, PasswordPolicy};
use thiserror::Error;

use crate::errors::{AppError, codes};

/// Reasons a password is refused at registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),
    #[error("Password must be at most {0} characters long")]
    TooLong(usize),
    #[error("Password must be at most {0} bytes long")]
    TooManyBytes(usize),
    #[error("Password must contain an uppercase letter")]
    MissingUppercase,
    #[error("Password must contain a lowercase letter")]
    MissingLowercase,
    #[error("Password must contain a digit")]
    MissingDigit,
    #[error("Password must contain a special character")]
    MissingSpecial,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Fails with 400 `INVALID_PASSWORD` for a password bcrypt would truncate.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let err = PasswordPolicyError::TooManyBytes(MAX_PASSWORD_BYTES);
        return Err(AppError::validation(err).with_code(codes::INVALID_PASSWORD));
    }

    non_truncating_hash(password, cost)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Returns `Ok(false)` on mismatch, including any password too long to have
/// been hashed. Errors only on a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    non_truncating_verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}

/// Checks `password` against `policy`, reporting the first rule it breaks.
pub fn validate_password(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if length < policy.min_length {
        return Err(PasswordPolicyError::TooShort(policy.min_length));
    }
    if length > policy.max_length {
        return Err(PasswordPolicyError::TooLong(policy.max_length));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordPolicyError::TooManyBytes(MAX_PASSWORD_BYTES));
    }
    if policy.require_uppercase && !password.chars().any(char::is_uppercase) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if policy.require_lowercase && !password.chars().any(char::is_lowercase) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if policy.require_digits && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if policy.require_special && password.chars().all(char::is_alphanumeric) {
        return Err(PasswordPolicyError::MissingSpecial);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_with_low_cost() {
        let hashed = hash_password_with_cost("Tr0ub4dor&3", 4).unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("Tr0ub4dor&3", &hashed).unwrap());
        assert!(!verify_password("tr0ub4dor&3", &hashed).unwrap());
    }

    #[test]
    fn test_shared_prefix_does_not_verify() {
        let prefix = "Aa1!".repeat(17);
        let stored = format!("{}xyz", prefix);
        let hashed = hash_password_with_cost(&stored, 4).unwrap();

        assert!(verify_password(&stored, &hashed).unwrap());
        assert!(!verify_password(&format!("{}xyw", prefix), &hashed).unwrap());
        assert!(!verify_password(&format!("{}xyz-and-more", prefix), &hashed).unwrap());
    }

    #[test]
    fn test_overlong_password_is_refused() {
        let long = format!("{}secretTail1", "Aa1!".repeat(18));

        let err = hash_password_with_cost(&long, 4).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, Some(codes::INVALID_PASSWORD));

        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hash_password_with_cost(&at_limit, 4).is_ok());
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_policy_accepts_strong_password() {
        let policy = PasswordPolicy::default();
        assert_eq!(validate_password("Str0ng!Pass", &policy), Ok(()));
    }

    #[test]
    fn test_policy_rejections() {
        let policy = PasswordPolicy::default();
        assert_eq!(validate_password("S1!a", &policy), Err(PasswordPolicyError::TooShort(8)));
        assert_eq!(
            validate_password("lowercase1!", &policy),
            Err(PasswordPolicyError::MissingUppercase)
        );
        assert_eq!(
            validate_password("UPPERCASE1!", &policy),
            Err(PasswordPolicyError::MissingLowercase)
        );
        assert_eq!(
            validate_password("NoDigits!!", &policy),
            Err(PasswordPolicyError::MissingDigit)
        );
        assert_eq!(
            validate_password("NoSpecial123", &policy),
            Err(PasswordPolicyError::MissingSpecial)
        );
    }

    #[test]
    fn test_policy_max_length() {
        let policy = PasswordPolicy {
            max_length: 10,
            ..PasswordPolicy::default()
        };
        assert_eq!(
            validate_password("Aa1!Aa1!Aa1!", &policy),
            Err(PasswordPolicyError::TooLong(10))
        );
    }

    #[test]
    fn test_policy_counts_bytes_for_bcrypt() {
        let policy = PasswordPolicy {
            max_length: 200,
            ..PasswordPolicy::relaxed()
        };
        // 40 characters but 80 bytes
        let wide = "é".repeat(40);
        assert_eq!(
            validate_password(&wide, &policy),
            Err(PasswordPolicyError::TooManyBytes(MAX_PASSWORD_BYTES))
        );
        assert_eq!(validate_password(&"é".repeat(35), &policy), Ok(()));
    }

    #[test]
    fn test_relaxed_policy() {
        assert_eq!(validate_password("a", &PasswordPolicy::relaxed()), Ok(()));
    }
}
