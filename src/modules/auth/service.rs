use anyhow::anyhow;
use secflow_auth::Principal;
use secflow_core::{
    AppError, Role, errors::codes, hash_password_with_cost, validate_password, verify_password,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::users::{DuplicateUser, UserRecord, UserSummary};
use crate::state::AppState;

use super::model::{LoginForm, RefreshRequest, RegisterRequest, TOKEN_TYPE, TokenResponse};

/// Accounts created at startup when `SEED_DEFAULT_USERS` is on:
/// (username, password, email, full name, role).
pub const DEFAULT_USERS: [(&str, &str, &str, &str, Role); 2] = [
    ("admin", "admin123", "admin@example.com", "Administrator", Role::Admin),
    ("user", "user123", "user@example.com", "Regular User", Role::User),
];

fn invalid_credentials() -> AppError {
    AppError::unauthorized(anyhow!("Incorrect username or password"))
        .with_code(codes::INVALID_CREDENTIALS)
}

// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_in_background(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password_with_cost(&password, cost))
        .await
        .map_err(AppError::internal)?
}

async fn verify_in_background(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(AppError::internal)?
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(state, dto), fields(username = %dto.username))]
    pub async fn register_user(
        state: &AppState,
        dto: RegisterRequest,
    ) -> Result<UserSummary, AppError> {
        if state.users.find_by_username(&dto.username).is_some() {
            warn!("Username already registered");
            return Err(DuplicateUser::Username(dto.username).into());
        }
        if state.users.email_taken(&dto.email) {
            warn!("Email already registered");
            return Err(DuplicateUser::Email(dto.email).into());
        }

        validate_password(&dto.password, &state.config.password).map_err(|e| {
            warn!(reason = %e, "Password rejected by policy");
            AppError::validation(e).with_code(codes::INVALID_PASSWORD)
        })?;

        let password_hash =
            hash_in_background(dto.password, state.config.password.hash_cost).await?;

        let record = UserRecord::new(
            dto.username,
            dto.email,
            dto.full_name,
            password_hash,
            dto.role,
        );

        // The checks above are repeated under the registration lock; a
        // concurrent registration can still win here.
        let user = state.users.insert_unique(record).await?;

        metrics::track_user_registered(user.role.as_str());
        info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(user)
    }

    #[instrument(skip(state, form), fields(username = %form.username))]
    pub async fn login_user(state: &AppState, form: LoginForm) -> Result<TokenResponse, AppError> {
        let Some(record) = state.users.find_by_username(&form.username) else {
            // Same bcrypt work as a wrong password, so response time does not
            // reveal which usernames exist.
            let decoy = Self::login_decoy(state).await?;
            verify_in_background(form.password, decoy).await?;

            warn!("Login failed: unknown username");
            metrics::track_login_failure("unknown_user");
            return Err(invalid_credentials());
        };

        if !verify_in_background(form.password, record.password_hash.clone()).await? {
            warn!(user_id = %record.id, "Login failed: wrong password");
            metrics::track_login_failure("wrong_password");
            return Err(invalid_credentials());
        }

        let subject = record.id.to_string();
        let access_token =
            state
                .tokens
                .issue_access_token(&subject, record.role, state.tokens.access_ttl())?;
        let refresh_token = state
            .tokens
            .issue_refresh_token(&subject, record.role, state.tokens.refresh_ttl())
            .await?;

        metrics::track_token_issued("access");
        metrics::track_token_issued("refresh");
        metrics::track_login_success(record.role.as_str());

        let user = state
            .users
            .record_login(record.id)
            .unwrap_or_else(|| UserSummary::from(&record));

        info!(user_id = %user.id, role = %user.role, "Login successful");

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: state.tokens.access_ttl().as_secs(),
            user,
        })
    }

    /// Issues a new access token. The refresh token itself is returned
    /// unchanged and stays valid until it expires or is revoked.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(
        state: &AppState,
        dto: RefreshRequest,
    ) -> Result<TokenResponse, AppError> {
        let principal = state.tokens.verify_refresh_token(&dto.refresh_token).await?;

        let record = state.users.find_by_id(&principal.subject_id).ok_or_else(|| {
            warn!(user_id = %principal.subject_id, "Refresh token subject no longer exists");
            AppError::unauthorized(anyhow!("User not found")).with_code(codes::USER_NOT_FOUND)
        })?;

        // The role comes from the user record, so role changes apply on the
        // next refresh.
        let access_token = state.tokens.issue_access_token(
            &principal.subject_id,
            record.role,
            state.tokens.access_ttl(),
        )?;

        metrics::track_token_issued("access");
        info!(user_id = %record.id, "Access token refreshed");

        Ok(TokenResponse {
            access_token,
            refresh_token: dto.refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: state.tokens.access_ttl().as_secs(),
            user: UserSummary::from(&record),
        })
    }

    /// Revokes every refresh token of the caller. Outstanding access tokens
    /// remain valid until they expire.
    #[instrument(skip_all, fields(user_id = %principal.subject_id))]
    pub async fn logout(state: &AppState, principal: &Principal) -> Result<u64, AppError> {
        let revoked = state
            .tokens
            .revoke_all_for_subject(&principal.subject_id)
            .await?;

        info!(revoked, "User logged out");
        Ok(revoked)
    }

    /// Hash verified against for unknown usernames, created at the configured
    /// cost on first use.
    pub async fn login_decoy(state: &AppState) -> Result<String, AppError> {
        state
            .login_decoy
            .get_or_try_init(|| {
                hash_in_background(Uuid::new_v4().to_string(), state.config.password.hash_cost)
            })
            .await
            .cloned()
    }

    /// Creates [`DEFAULT_USERS`]. Accounts that already exist are left alone.
    /// These bypass the password policy.
    pub async fn seed_default_users(state: &AppState) -> Result<usize, AppError> {
        let mut created = 0;

        for (username, password, email, full_name, role) in DEFAULT_USERS {
            if state.users.find_by_username(username).is_some() {
                continue;
            }

            let password_hash =
                hash_in_background(password.to_string(), state.config.password.hash_cost).await?;
            let record = UserRecord::new(username, email, full_name, password_hash, role);

            match state.users.insert_unique(record).await {
                Ok(user) => {
                    info!(user_id = %user.id, username, role = %role, "Default user created");
                    created += 1;
                }
                Err(e) => warn!(error = %e, "Default user skipped"),
            }
        }

        Ok(created)
    }
}
