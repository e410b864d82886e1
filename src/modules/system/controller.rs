use axum::{Json, extract::State};
use chrono::Utc;
use tracing::warn;

use super::model::{ComponentHealth, ComponentStatus, Components, HealthResponse, ServiceInfo};
use crate::state::AppState;

const ENDPOINTS: [&str; 13] = [
    "POST /auth/register",
    "POST /auth/login",
    "POST /auth/refresh",
    "POST /auth/logout",
    "GET /protected/me",
    "GET /protected/admin",
    "GET /protected/items",
    "POST /protected/items",
    "PUT /protected/items/{item_id}",
    "DELETE /protected/items/{item_id}",
    "GET /protected/users/{user_id}",
    "GET /protected/data",
    "GET /protected/token-info",
];

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// Always answers 200. A failing token store turns the overall status to
/// `DEGRADED` rather than failing the probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.tokens.store();
    let store_status = match store.ping().await {
        Ok(()) => ComponentStatus::Up,
        Err(e) => {
            warn!(error = %e, backend = store.backend(), "Token store health check failed");
            ComponentStatus::Down
        }
    };

    let overall = if store_status == ComponentStatus::Up {
        ComponentStatus::Up
    } else {
        ComponentStatus::Degraded
    };

    Json(HealthResponse {
        status: overall,
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: Components {
            app: ComponentHealth {
                status: ComponentStatus::Up,
                backend: "axum".to_string(),
            },
            token_store: ComponentHealth {
                status: store_status,
                backend: store.backend().to_string(),
            },
            rate_limiter: ComponentHealth {
                status: if state.rate_limiter.enabled() {
                    ComponentStatus::Up
                } else {
                    ComponentStatus::Down
                },
                backend: state.rate_limiter.backend_name().to_string(),
            },
        },
    })
}
