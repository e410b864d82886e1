use axum::{
    Router, middleware,
    routing::{get, put},
};

use super::controller::{
    admin_only, create_item, delete_item, get_user, list_items, me, read_data, token_info,
    update_item,
};
use crate::middleware::{auth::authenticate, role::require_admin};
use crate::state::AppState;

/// Every route here requires a valid access token. `/admin` additionally
/// requires the `ADMIN` role; the other routes check permissions or
/// ownership in their extractors.
pub fn init_protected_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/admin", get(admin_only))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/me", get(me))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{item_id}", put(update_item).delete(delete_item))
        .route("/users/{user_id}", get(get_user))
        .route("/data", get(read_data))
        .route("/token-info", get(token_info))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}
