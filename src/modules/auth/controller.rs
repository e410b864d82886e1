use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use secflow_core::AppError;

use super::model::{LoginForm, LogoutResponse, RefreshRequest, RegisterRequest, TokenResponse};
use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::modules::users::UserSummary;
use crate::state::AppState;
use crate::validator::{ValidatedForm, ValidatedJson};

/// Register a new user
///
/// `POST /auth/register` with a JSON body. Returns 201 and the user summary,
/// or 400 for invalid input, a duplicate username/email or a weak password.
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let user = AuthService::register_user(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with a form-encoded username and password
///
/// ```text
/// curl -X POST http://localhost:8000/auth/login \
///      -H "Content-Type: application/x-www-form-urlencoded" \
///      -d "username=admin&password=admin123"
/// ```
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::login_user(&state, form).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::refresh_tokens(&state, dto).await?;
    Ok(Json(response))
}

/// Revoke all refresh tokens of the authenticated user
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<LogoutResponse>, AppError> {
    let revoked_tokens = AuthService::logout(&state, &auth_user.0).await?;
    Ok(Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
        revoked_tokens,
    }))
}
