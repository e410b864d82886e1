//! # SecFlow Core
//!
//! Core types, errors, and utilities shared by every SecFlow crate.
//!
//! - [`errors`]: Application error type and the uniform error body
//! - [`password`]: Password hashing, verification and policy checks
//! - [`permissions`]: Roles, permissions and the role grant table
//!
//! # Example
//!
//! ```ignore
//! use secflow_core::errors::AppError;
//! use secflow_core::password::{hash_password, verify_password};
//!
//! let error = AppError::forbidden(anyhow::anyhow!("Admin role required"));
//!
//! let hash = hash_password("S3cure!pass")?;
//! assert!(verify_password("S3cure!pass", &hash)?);
//! ```

pub mod errors;
pub mod password;
pub mod permissions;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorBody};
pub use password::{
    PasswordPolicyError, hash_password, hash_password_with_cost, validate_password, verify_password,
};
pub use permissions::{Permission, Role};
