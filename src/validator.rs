use anyhow::anyhow;
use axum::{
    Form, Json,
    extract::{
        FromRequest, Request,
        rejection::{FormRejection, JsonRejection},
    },
};
use secflow_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join(", ")
}

fn missing_field(body_text: &str) -> Option<&str> {
    body_text
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
}

/// JSON body extractor that runs `validator` rules.
///
/// Every failure, malformed JSON included, is a 400 `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if let Some(field) = missing_field(&error_msg) {
                    return AppError::validation(anyhow!("{} is required", field));
                }

                if error_msg.contains("invalid type") {
                    return AppError::validation(anyhow!("Invalid field type in request"));
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::validation(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    ));
                }

                AppError::validation(anyhow!("Invalid request body"))
            })?;

        value
            .validate()
            .map_err(|errors| AppError::validation(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

/// `application/x-www-form-urlencoded` counterpart of [`ValidatedJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if let Some(field) = missing_field(&error_msg) {
                    return AppError::validation(anyhow!("{} is required", field));
                }

                if matches!(rejection, FormRejection::InvalidFormContentType(_)) {
                    return AppError::validation(anyhow!(
                        "Missing 'Content-Type: application/x-www-form-urlencoded' header"
                    ));
                }

                AppError::validation(anyhow!("Invalid form body"))
            })?;

        value
            .validate()
            .map_err(|errors| AppError::validation(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedForm(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, message = "name must be at least 3 characters"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_passes() {
        let ValidatedJson(payload) =
            ValidatedJson::<Payload>::from_request(json_request(r#"{"name":"alice"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "alice");
    }

    #[tokio::test]
    async fn test_rule_violation_is_bad_request() {
        let err = ValidatedJson::<Payload>::from_request(json_request(r#"{"name":"al"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "name must be at least 3 characters");
    }

    #[tokio::test]
    async fn test_missing_field_is_named() {
        let err = ValidatedJson::<Payload>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "name is required");
    }

    #[tokio::test]
    async fn test_form_without_content_type_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .body(Body::from("name=alice"))
            .unwrap();
        let err = ValidatedForm::<Payload>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_valid_form_passes() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=alice"))
            .unwrap();
        let ValidatedForm(payload) = ValidatedForm::<Payload>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(payload.name, "alice");
    }
}
