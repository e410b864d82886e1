//! # SecFlow Auth
//!
//! Bearer-token issuing and verification.
//!
//! - [`claims`]: What a signed token carries
//! - [`principal`]: The verified identity handed to guards and handlers
//! - [`service`]: [`TokenService`], which signs, verifies and revokes tokens
//! - [`error`]: [`TokenError`] and its mapping onto HTTP errors
//!
//! # Token Types
//!
//! - **Access token**: short-lived and stateless. Carries role and permissions.
//! - **Refresh token**: long-lived. Only honoured while its id is present in
//!   the [`TokenStore`](secflow_cache::TokenStore), so it can be revoked.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use secflow_auth::TokenService;
//! use secflow_cache::MemoryTokenStore;
//! use secflow_config::JwtConfig;
//! use secflow_core::Role;
//!
//! let service = TokenService::new(&JwtConfig::from_env()?, Arc::new(MemoryTokenStore::new()))?;
//! let token = service.issue_access_token("user-id", Role::User, service.access_ttl())?;
//! let principal = service.verify_access_token(&token)?;
//! assert_eq!(principal.subject_id, "user-id");
//! ```

pub mod claims;
pub mod error;
pub mod principal;
pub mod service;

// Re-export commonly used types at crate root
pub use claims::{Claims, TokenKind};
pub use error::TokenError;
pub use principal::Principal;
pub use service::TokenService;
