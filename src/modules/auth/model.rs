use secflow_core::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::users::model::UserSummary;

pub const TOKEN_TYPE: &str = "bearer";

// Registration request. The password policy is checked separately so that
// its failures carry their own error code.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "full_name must be at most 100 characters"))]
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

// Form-encoded login, as sent by OAuth2 password-flow clients
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    pub revoked_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_role_defaults_to_user() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","password":"Secret1!x","email":"alice@example.com"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::User);
        assert_eq!(req.full_name, "");
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            username: "al".to_string(),
            password: "x".to_string(),
            email: "not-an-email".to_string(),
            full_name: String::new(),
            role: Role::User,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("password"));
    }
}
