//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::SignupRequest as NewSignup;
use crate::web::dto::{
    ApiResponse, CsrfTokenResponse, LoginRequest, LoginResponse, SignupRequest, UserInfo,
    ValidatedInput,
};
use crate::web::error::ApiError;
use crate::web::middleware::{
    removal_cookie, site_cookie, AuthUser, CurrentSession, SessionChange, ACCESS_TOKEN_COOKIE,
};
use crate::web::state::AppState;

/// GET /auth/csrf-token - Token for the caller's session.
///
/// A caller without a session cookie gets a fresh session, whose cookie the
/// session middleware sets on this response.
pub async fn csrf_token(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<CsrfTokenResponse>>, ApiError> {
    let csrf_token = state.csrf.issue(&current.session)?;
    Ok(Json(ApiResponse::new(CsrfTokenResponse { csrf_token })))
}

/// POST /auth/signup - Register a new user.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedInput(req): ValidatedInput<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let mut request = NewSignup::new(req.email, req.username, req.password)
        .with_password_confirm(req.password_confirm);
    if let Some(display_name) = req.display_name {
        request = request.with_display_name(display_name);
    }

    let user = state.auth().signup(&request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(user.into()))))
}

/// POST /auth/login - Log in and replace the session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
    ValidatedInput(req): ValidatedInput<LoginRequest>,
) -> Result<
    (
        CookieJar,
        Extension<SessionChange>,
        Json<ApiResponse<LoginResponse>>,
    ),
    ApiError,
> {
    let outcome = state
        .auth()
        .login(&req.email, &req.password, Some(current.session.id.as_str()))
        .await?;

    let jar = jar.add(site_cookie(
        ACCESS_TOKEN_COOKIE,
        outcome.access_token.clone(),
        state.config.auth.secure_cookies,
    ));

    let response = LoginResponse {
        access_token: outcome.access_token,
        token_type: "Bearer",
        expires_in: state.tokens.expiry_secs(),
        csrf_token: outcome.csrf_token,
        user: outcome.user.into(),
    };

    Ok((
        jar,
        Extension(SessionChange::Rotated(outcome.session)),
        Json(ApiResponse::new(response)),
    ))
}

/// POST /auth/logout - Destroy the session and clear both cookies.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
) -> (CookieJar, Extension<SessionChange>, StatusCode) {
    state.auth().logout(&current.session.id);
    tracing::info!(user_id = %user.id, "User logged out");

    (
        jar.add(removal_cookie(ACCESS_TOKEN_COOKIE)),
        Extension(SessionChange::Ended),
        StatusCode::NO_CONTENT,
    )
}

/// GET /auth/me - Current user's profile.
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<UserInfo>> {
    Json(ApiResponse::new(user.into()))
}
