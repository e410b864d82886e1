//! Protective response headers.
//!
//! Applied outside every route, so error responses (401, 404, 429) carry them
//! too. `Content-Security-Policy` is only filled in when the handler did not
//! choose its own; every other header overrides whatever the handler set.
//!
//! # Example
//!
//! ```ignore
//! use secflow::middleware::security_headers::with_security_headers;
//!
//! let app = with_security_headers(Router::new().route("/", get(root)));
//! ```

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
    },
};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

pub const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

pub const DEFAULT_CSP: &str = "default-src 'self'";

/// Every header this module sets, with its value.
pub const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "camera=(), microphone=(), geolocation=()"),
    ("content-security-policy", DEFAULT_CSP),
];

fn overriding(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Wraps `router` so every response leaves with the protective headers.
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(overriding(X_CONTENT_TYPE_OPTIONS, SECURITY_HEADERS[0].1))
            .layer(overriding(X_FRAME_OPTIONS, SECURITY_HEADERS[1].1))
            .layer(overriding(X_XSS_PROTECTION, SECURITY_HEADERS[2].1))
            .layer(overriding(STRICT_TRANSPORT_SECURITY, SECURITY_HEADERS[3].1))
            .layer(overriding(REFERRER_POLICY, SECURITY_HEADERS[4].1))
            .layer(overriding(PERMISSIONS_POLICY, SECURITY_HEADERS[5].1))
            .layer(SetResponseHeaderLayer::if_not_present(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(DEFAULT_CSP),
            )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
        routing::get,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        with_security_headers(
            Router::new()
                .route("/", get(|| async { "ok" }))
                .route(
                    "/custom-csp",
                    get(|| async {
                        ([(CONTENT_SECURITY_POLICY, "default-src 'none'")], "ok").into_response()
                    }),
                )
                .route(
                    "/framed",
                    get(|| async { ([(X_FRAME_OPTIONS, "SAMEORIGIN")], "ok").into_response() }),
                ),
        )
    }

    async fn get_path(path: &str) -> axum::response::Response {
        app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_all_headers_present() {
        let response = get_path("/").await;
        for (name, value) in SECURITY_HEADERS {
            assert_eq!(response.headers().get(name).unwrap(), value, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_headers_on_unmatched_route() {
        let response = get_path("/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_handler_csp_is_kept() {
        let response = get_path("/custom-csp").await;
        assert_eq!(
            response.headers().get(CONTENT_SECURITY_POLICY).unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn test_frame_options_overridden() {
        let response = get_path("/framed").await;
        assert_eq!(response.headers().get(X_FRAME_OPTIONS).unwrap(), "DENY");
    }
}
