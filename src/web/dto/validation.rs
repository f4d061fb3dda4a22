//! Validating extractors and custom validators for Web API DTOs.

use axum::{
    async_trait,
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

fn json_rejection(e: JsonRejection) -> ApiError {
    match e {
        // Well-formed JSON of the wrong shape, such as an unknown tier
        JsonRejection::JsonDataError(e) => ApiError::unprocessable(e.body_text()),
        other => ApiError::bad_request(format!("Invalid JSON: {other}")),
    }
}

fn form_rejection(e: FormRejection) -> ApiError {
    match e {
        FormRejection::FailedToDeserializeFormBody(e) => ApiError::unprocessable(e.body_text()),
        other => ApiError::bad_request(format!("Invalid form: {other}")),
    }
}

/// A JSON extractor that validates the request body.
///
/// This extractor deserializes the request body as JSON and then validates it
/// using the `validator` crate. If validation fails, it returns a detailed
/// error response with field-level error information.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Like [`ValidatedJson`], but also accepts a urlencoded form body.
///
/// Used by the auth endpoints, which are posted by plain HTML forms.
pub struct ValidatedInput<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedInput<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let value = if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(form_rejection)?;
            value
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(json_rejection)?;
            value
        };

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedInput(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}
