use crate::logging::logging_middleware;
use crate::metrics::{metrics_middleware, metrics_router};
use crate::middleware::error_envelope::error_envelope;
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::security_headers::with_security_headers;
use crate::modules::auth::router::init_auth_router;
use crate::modules::protected::router::init_protected_router;
use crate::modules::system::router::init_system_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// A wildcard origin answers `*` and drops credentials, since browsers refuse
/// credentialed responses for `*`.
fn cors_layer(state: &AppState) -> CorsLayer {
    let cors = &state.config.cors;

    let (origin, credentials) = if cors.allows_any_origin() {
        (AllowOrigin::any(), false)
    } else {
        let allowed_origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        (AllowOrigin::list(allowed_origins), true)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(credentials)
}

/// Builds the full application.
///
/// Layers run outermost first: request logging, HTTP metrics, the error
/// envelope, security headers, CORS, then rate limiting. Route-level guards
/// sit inside the `/protected` router.
pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .merge(init_system_router())
        .nest("/auth", init_auth_router())
        .nest("/protected", init_protected_router(state.clone()));

    if let Some(handle) = metrics {
        app = app.merge(metrics_router(handle));
    }

    let app = app
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer(&state));

    with_security_headers(app)
        .layer(middleware::from_fn(error_envelope))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
