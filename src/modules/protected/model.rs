use chrono::{DateTime, Utc};
use secflow_core::{Permission, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub username: Option<String>,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<String>,
    pub accessed_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenInfoResponse {
    pub subject: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
