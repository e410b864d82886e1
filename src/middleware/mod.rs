//! Middleware modules for request processing.
//!
//! This module contains middleware and extractors for handling cross-cutting
//! concerns like authentication, authorization, and request protection.
//!
//! # Modules
//!
//! - [`auth`]: Bearer authentication, permission and ownership guards
//! - [`role`]: Role guards as route layers, extractors and helpers
//! - [`security_headers`]: Protective response headers
//! - [`rate_limit`]: Per-client request ceilings
//! - [`error_envelope`]: Uniform error body with the request path
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `authenticate` (route layer) or `AuthUser` (extractor) verifies the
//!    access token and yields a `Principal`
//! 3. Role and permission guards check the principal
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use secflow::middleware::auth::{AuthUser, RequireWriteItems};
//!
//! // Basic authentication (any valid access token)
//! async fn me(auth_user: AuthUser) -> impl IntoResponse {
//!     Json(auth_user.0)
//! }
//!
//! // Permission-based access control
//! async fn create_item(
//!     RequireWriteItems(auth_user): RequireWriteItems,
//! ) -> impl IntoResponse {
//!     // Only executes if the token carries WRITE_ITEMS
//! }
//! ```

pub mod auth;
pub mod error_envelope;
pub mod rate_limit;
pub mod role;
pub mod security_headers;
