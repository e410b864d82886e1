#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use secflow::middleware::rate_limit::RateLimiter;
use secflow::modules::auth::service::AuthService;
use secflow::router::init_router;
use secflow::state::AppState;
use secflow_cache::MemoryTokenStore;
use secflow_config::{AppConfig, JwtConfig, PasswordPolicy, RateLimitConfig};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only";

/// Relaxed limits and cheap hashing so tests stay fast and independent.
pub fn test_config() -> AppConfig {
    AppConfig {
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ..JwtConfig::default()
        },
        password: PasswordPolicy {
            hash_cost: 4,
            ..PasswordPolicy::default()
        },
        rate_limit: RateLimitConfig {
            max_requests: 1000,
            auth_max_requests: 1000,
            ..RateLimitConfig::default()
        },
        ..AppConfig::default()
    }
}

pub async fn state_with(config: AppConfig) -> AppState {
    let rate_limiter = RateLimiter::local(&config.rate_limit).unwrap();
    let state = AppState::new(config, Arc::new(MemoryTokenStore::new()), rate_limiter).unwrap();
    AuthService::seed_default_users(&state).await.unwrap();
    state
}

pub async fn test_state() -> AppState {
    state_with(test_config()).await
}

pub async fn test_app() -> Router {
    init_router(test_state().await, None)
}

pub fn strict_rate_limit_config(max_requests: u32, auth_max_requests: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        auth_max_requests,
        window: Duration::from_secs(60),
        auth_window: Duration::from_secs(60),
        ..RateLimitConfig::default()
    }
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            username, password
        )))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Logs in and returns the full token response.
pub async fn login(app: &Router, username: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(login_request(username, password))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

pub async fn access_token(app: &Router, username: &str, password: &str) -> String {
    login(app, username, password).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
