//! Role-based authorization for Axum
//!
//! Three ways to guard a route on the caller's role:
//! 1. Route layers: [`require_roles`] and the [`require_admin`] wrapper
//! 2. The [`RequireAdmin`] extractor
//! 3. [`check_role`] / [`check_any_role`] for checks inside handler logic
//!
//! Roles are compared for equality only. There is no hierarchy: an `EDITOR`
//! does not satisfy a route that requires `USER`.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use secflow_auth::Principal;
use secflow_core::{AppError, Role};

use crate::middleware::auth::{AuthUser, require_authenticated};
use crate::state::AppState;

/// Authenticates the request and requires `role`.
///
/// Fails with 401 when there is no valid access token and 403 when the
/// principal's role differs.
pub fn require_role(parts: &Parts, state: &AppState, role: Role) -> Result<Principal, AppError> {
    let principal = require_authenticated(parts, state)?;
    check_principal_roles(&principal, &[role])?;
    Ok(principal)
}

/// Middleware that checks the authenticated user has one of `allowed_roles`.
///
/// # Usage with axum::middleware::from_fn_with_state
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use secflow::middleware::role::require_roles;
/// use secflow_core::Role;
///
/// let editor_routes = Router::new()
///     .route("/drafts", get(drafts_handler))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         |state, req, next| require_roles(state, req, next, &[Role::Admin, Role::Editor]),
///     ));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
    allowed_roles: &[Role],
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    let principal = require_authenticated(&parts, &state)?;
    check_principal_roles(&principal, allowed_roles)?;

    req = Request::from_parts(parts, body);
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Route layer for administrator-only routes.
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/admin", get(admin_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[Role::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Extractor for administrator access.
///
/// ```rust,ignore
/// pub async fn purge_handler(RequireAdmin(admin): RequireAdmin) -> Result<Json<_>, AppError> {
///     // Only administrators reach this point
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = require_role(parts, state, Role::Admin)?;
        Ok(RequireAdmin(AuthUser(principal)))
    }
}

/// Checks the user has exactly `required_role`.
///
/// ```rust,ignore
/// pub async fn handler(auth_user: AuthUser) -> Result<Json<_>, AppError> {
///     check_role(&auth_user, Role::Editor)?;
///     // Handler logic
/// }
/// ```
pub fn check_role(auth_user: &AuthUser, required_role: Role) -> Result<(), AppError> {
    check_principal_roles(&auth_user.0, &[required_role])
}

/// Checks the user has any of `allowed_roles`.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<(), AppError> {
    check_principal_roles(&auth_user.0, allowed_roles)
}

fn check_principal_roles(principal: &Principal, allowed_roles: &[Role]) -> Result<(), AppError> {
    if allowed_roles.contains(&principal.role) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %principal.subject_id,
        role = %principal.role,
        "Role check failed"
    );

    let required = allowed_roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" or ");

    Err(AppError::forbidden(anyhow!(
        "Access denied. Required role: {}",
        required
    )))
}
