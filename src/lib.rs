//! # SecFlow
//!
//! A bearer-token authentication service built with Axum: it issues and
//! verifies JWT access and refresh tokens, guards routes by role, permission
//! and ownership, and wraps every response in a security middleware stack.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── secflow-core/     # AppError, roles and permissions, password hashing
//! ├── secflow-config/   # Environment configuration
//! ├── secflow-auth/     # Token service (issue, verify, revoke)
//! └── secflow-cache/    # Refresh token stores and the shared rate counter
//! src/
//! ├── middleware/       # Auth guard, role guard, rate limit, headers, errors
//! ├── modules/          # auth, protected, system, users
//! ├── logging.rs        # Subscriber setup and request logging
//! ├── metrics.rs        # Prometheus recorder and helpers
//! ├── router.rs         # Route tree and layer order
//! └── state.rs          # Shared application state
//! ```
//!
//! Each feature module follows the same layout: `controller.rs` for
//! handlers, `service.rs` for logic, `model.rs` for DTOs and `router.rs` for
//! its routes.
//!
//! ## Roles
//!
//! | Role | Permissions |
//! |------|-------------|
//! | `ADMIN` | read/write items, read data |
//! | `EDITOR` | read/write items |
//! | `USER` | read items |
//!
//! ## Tokens
//!
//! - **Access token**: short-lived (default 30 minutes), carries role and
//!   permissions.
//! - **Refresh token**: long-lived (default 7 days), carries the role only and
//!   is honoured while its entry exists in the token store. Logout removes
//!   every entry for the user.
//!
//! ## Quick Start
//!
//! ```bash
//! JWT_SECRET=change-me-to-at-least-32-bytes-of-entropy
//! TOKEN_STORE=memory          # or redis
//! RATE_LIMIT_BACKEND=local    # or redis
//! cargo run -- --port 8000
//! ```

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use secflow_auth;
pub use secflow_cache;
pub use secflow_config;
pub use secflow_core;
