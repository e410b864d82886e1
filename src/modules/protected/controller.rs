//! Routes behind bearer authentication.
//!
//! The router authenticates every request first; each handler then states
//! its own requirement through the extractor it takes.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use secflow_core::{AppError, errors::codes};
use tracing::info;
use uuid::Uuid;

use super::model::{
    DataResponse, ItemRequest, ItemResponse, ItemsResponse, MeResponse, MessageResponse,
    TokenInfoResponse,
};
use crate::middleware::auth::{
    AuthUser, RequireReadData, RequireReadItems, RequireWriteItems, require_owner,
};
use crate::middleware::role::RequireAdmin;
use crate::modules::users::UserSummary;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Any authenticated user
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> Json<MeResponse> {
    let principal = auth_user.0;
    let username = state
        .users
        .find_by_id(&principal.subject_id)
        .map(|record| record.username);

    Json(MeResponse {
        user_id: principal.subject_id,
        username,
        role: principal.role,
        permissions: principal.permissions,
        message: "Authenticated".to_string(),
    })
}

/// Guarded by the `require_admin` route layer
pub async fn admin_only() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Admin access granted".to_string(),
    })
}

pub async fn list_items(RequireReadItems(auth_user): RequireReadItems) -> Json<ItemsResponse> {
    info!(user_id = %auth_user.subject_id(), "Listing items");
    Json(ItemsResponse {
        items: vec!["Item 1".into(), "Item 2".into(), "Item 3".into()],
    })
}

pub async fn create_item(
    RequireWriteItems(auth_user): RequireWriteItems,
    ValidatedJson(item): ValidatedJson<ItemRequest>,
) -> (StatusCode, Json<ItemResponse>) {
    let id = format!("item_{}", Uuid::new_v4().simple());
    info!(item_id = %id, user_id = %auth_user.subject_id(), "Item created");

    (
        StatusCode::CREATED,
        Json(ItemResponse {
            id,
            name: item.name,
            created_by: Some(auth_user.subject_id().to_string()),
            message: "Item created".to_string(),
        }),
    )
}

pub async fn update_item(
    RequireAdmin(_admin): RequireAdmin,
    Path(item_id): Path<String>,
    ValidatedJson(item): ValidatedJson<ItemRequest>,
) -> Json<ItemResponse> {
    info!(item_id = %item_id, "Item updated");
    Json(ItemResponse {
        id: item_id,
        name: item.name,
        created_by: None,
        message: "Item updated".to_string(),
    })
}

pub async fn delete_item(
    RequireAdmin(_admin): RequireAdmin,
    Path(item_id): Path<String>,
) -> Json<MessageResponse> {
    info!(item_id = %item_id, "Item deleted");
    Json(MessageResponse {
        message: format!("Item {} deleted", item_id),
    })
}

/// Owner or administrator
pub async fn get_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserSummary>, AppError> {
    require_owner(&auth_user.0, &user_id)?;

    let record = state.users.find_by_id(&user_id).ok_or_else(|| {
        AppError::not_found(anyhow!("User {} not found", user_id)).with_code(codes::USER_NOT_FOUND)
    })?;

    Ok(Json(UserSummary::from(record)))
}

pub async fn read_data(RequireReadData(auth_user): RequireReadData) -> Json<DataResponse> {
    Json(DataResponse {
        data: vec!["report-2024-q1".into(), "report-2024-q2".into()],
        accessed_by: auth_user.subject_id().to_string(),
    })
}

pub async fn token_info(auth_user: AuthUser) -> Json<TokenInfoResponse> {
    let principal = auth_user.0;
    Json(TokenInfoResponse {
        subject: principal.subject_id,
        role: principal.role,
        permissions: principal.permissions,
        token_id: principal.token_id,
        issued_at: principal.issued_at,
        expires_at: principal.expires_at,
    })
}
