use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use secflow_auth::Principal;
use secflow_core::{AppError, Permission, errors::codes};

use crate::state::AppState;

/// Extractor that verifies the bearer access token and provides the
/// authenticated principal.
///
/// When the [`authenticate`] layer already ran, the principal it stored in the
/// request extensions is reused instead of verifying the token twice.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    pub fn subject_id(&self) -> &str {
        &self.0.subject_id
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.0.has_permission(permission)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.0.has_all_permissions(permissions)
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_authenticated(parts, state).map(AuthUser)
    }
}

fn invalid_header() -> AppError {
    AppError::unauthorized(anyhow!("Invalid authorization header format"))
}

/// Pulls the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively. A missing header is reported
/// with `MISSING_TOKEN`, anything unparsable with `INVALID_TOKEN`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        AppError::unauthorized(anyhow!("Not authenticated")).with_code(codes::MISSING_TOKEN)
    })?;

    let value = value.to_str().map_err(|_| invalid_header())?;
    let (scheme, token) = value.trim().split_once(' ').ok_or_else(invalid_header)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(invalid_header());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(invalid_header());
    }

    Ok(token)
}

/// Resolves the principal for this request.
///
/// Only access tokens are accepted; presenting a refresh token here is an
/// `INVALID_TOKEN` failure.
pub fn require_authenticated(parts: &Parts, state: &AppState) -> Result<Principal, AppError> {
    if let Some(principal) = parts.extensions.get::<Principal>() {
        return Ok(principal.clone());
    }

    let token = bearer_token(&parts.headers)?;
    let principal = state.tokens.verify_access_token(token)?;

    Ok(principal)
}

/// Route layer that authenticates every request passing through it and
/// stores the [`Principal`] in the request extensions.
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/me", get(me))
///     .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));
/// ```
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;
    let principal = state.tokens.verify_access_token(token)?;

    tracing::debug!(user_id = %principal.subject_id, role = %principal.role, "Request authenticated");
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Fails with 403 unless `principal` holds every permission in `required`.
pub fn require_permissions(principal: &Principal, required: &[Permission]) -> Result<(), AppError> {
    let missing = principal.missing_permissions(required);
    if missing.is_empty() {
        return Ok(());
    }

    let names = missing
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Err(AppError::forbidden(anyhow!(
        "Access denied. Missing required permissions: {}",
        names
    )))
}

/// Fails with 403 unless `resource_id` is the principal's own id.
/// Administrators may access any resource.
pub fn require_owner(principal: &Principal, resource_id: &str) -> Result<(), AppError> {
    if principal.is_admin() || principal.subject_id == resource_id {
        return Ok(());
    }

    Err(
        AppError::forbidden(anyhow!("Access denied. You can only access your own resources"))
            .with_code(codes::NOT_RESOURCE_OWNER),
    )
}

/// Helper macro to create permission check extractors.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::secflow_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                $crate::middleware::auth::require_permissions(&auth_user.0, &[$permission])?;

                Ok($name(auth_user))
            }
        }
    };
}

require_permission!(RequireReadItems, Permission::ReadItems);
require_permission!(RequireWriteItems, Permission::WriteItems);
require_permission!(RequireReadData, Permission::ReadData);
