//! Authentication extractors.
//!
//! The access token is read from `Authorization: Bearer ...` or, failing
//! that, the `access_token` cookie. Resolution goes through
//! [`AuthService::authenticate`](crate::auth::AuthService::authenticate),
//! so the token's session must be alive and the profile is reloaded on
//! every request.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::db::User;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use crate::AizevaError;

/// Name of the access-token cookie.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for authenticated users.
///
/// Rejects with 401 when no valid token is present and 403 when the
/// account has been deactivated.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            access_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;
        let user = state.auth().authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

/// Optional authentication extractor.
///
/// Similar to AuthUser but treats a missing or invalid token as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = access_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };

        match state.auth().authenticate(&token).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(AizevaError::Auth(_)) | Err(AizevaError::Permission(_)) => {
                Ok(OptionalAuthUser(None))
            }
            Err(e) => Err(e.into()),
        }
    }
}
