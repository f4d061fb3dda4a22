//! CSRF middleware.
//!
//! Every mutating request must carry the token of the session named by its
//! cookie, either in the `X-CSRF-Token` header or in the `csrf_token` field
//! of a urlencoded form body. Runs inside the session middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::session::CurrentSession;
use crate::auth::{CSRF_FORM_FIELD, CSRF_HEADER};
use crate::web::error::ApiError;
use crate::web::state::AppState;

/// Largest form body buffered to look for the token.
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn is_urlencoded_form(req: &Request<Body>) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Read the form token and put the body back for the handler.
async fn take_form_token(req: Request<Body>) -> Result<(Request<Body>, Option<String>), ApiError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;

    let token = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned());

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

/// CSRF middleware.
pub async fn csrf_protect(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutating(req.method()) {
        return next.run(req).await;
    }

    // A session created for this very request was not named by a cookie.
    let session_id = req
        .extensions()
        .get::<CurrentSession>()
        .filter(|c| !c.is_new)
        .map(|c| c.session.id.clone());

    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (req, submitted) = match header_token {
        Some(token) => (req, Some(token)),
        None if is_urlencoded_form(&req) => match take_form_token(req).await {
            Ok(pair) => pair,
            Err(e) => return e.into_response(),
        },
        None => (req, None),
    };

    if let Err(e) = state
        .csrf
        .verify(session_id.as_deref(), submitted.as_deref())
    {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            reason = %e,
            "CSRF check failed"
        );
        return ApiError::from(e).into_response();
    }

    next.run(req).await
}
