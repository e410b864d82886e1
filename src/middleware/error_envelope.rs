use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use secflow_core::ErrorBody;

/// Gives every 4xx/5xx response the uniform error body and fills in the
/// request path.
///
/// Responses built from an `AppError` already carry their [`ErrorBody`] in the
/// response extensions; anything else (unmatched routes, wrong method) gets
/// a body derived from its status. Headers such as `Retry-After` and `Allow`
/// are kept.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, _body) = response.into_parts();
    let error_body = parts
        .extensions
        .remove::<ErrorBody>()
        .unwrap_or_else(|| ErrorBody::from_status(status))
        .with_path(path);

    let bytes = match serde_json::to_vec(&error_body) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.extensions.insert(error_body);

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use http_body_util::BodyExt;
    use secflow_core::{AppError, errors::codes};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/denied",
                get(|| async {
                    Err::<(), _>(AppError::forbidden(anyhow::anyhow!("Admin role required")))
                }),
            )
            .route(
                "/slow-down",
                get(|| async { Err::<(), _>(AppError::too_many_requests(12)) }),
            )
            .layer(middleware::from_fn(error_envelope))
    }

    async fn call(method: &str, path: &str) -> Response {
        app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn error_body(response: Response) -> ErrorBody {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_app_error_gets_path() {
        let response = call("GET", "/denied").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = error_body(response).await;
        assert_eq!(body.path, "/denied");
        assert_eq!(body.message, "Admin role required");
        assert_eq!(body.error_code.as_deref(), Some(codes::INSUFFICIENT_PERMISSIONS));
    }

    #[tokio::test]
    async fn test_unmatched_route_uses_uniform_body() {
        let response = call("GET", "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = error_body(response).await;
        assert_eq!(body.status, 404);
        assert_eq!(body.error, "Not Found");
        assert_eq!(body.path, "/missing");
    }

    #[tokio::test]
    async fn test_wrong_method_keeps_allow_header() {
        let response = call("POST", "/ok").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().get(header::ALLOW).is_some());

        let body = error_body(response).await;
        assert_eq!(body.status, 405);
    }

    #[tokio::test]
    async fn test_retry_after_survives() {
        let response = call("GET", "/slow-down").await;
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "12");
        assert_eq!(error_body(response).await.path, "/slow-down");
    }

    #[tokio::test]
    async fn test_success_untouched() {
        let response = call("GET", "/ok").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }
}
