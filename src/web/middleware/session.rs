//! Session middleware.
//!
//! Resolves the `session_id` cookie to a live session, creating a new one
//! when the cookie is missing or stale. After the handler runs, the cookie
//! and the `X-CSRF-Token` header are written onto the actual response.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::{Session, CSRF_HEADER};
use crate::web::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// The session resolved for the current request.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Session state at the start of the request.
    pub session: Session,
    /// True when the request carried no usable session cookie.
    pub is_new: bool,
}

/// Response extension set by handlers that replace or end the session.
#[derive(Debug, Clone)]
pub enum SessionChange {
    /// The session was replaced (login).
    Rotated(Session),
    /// The session was destroyed (logout).
    Ended,
}

/// Build an HttpOnly cookie scoped to the whole site.
pub fn site_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Build a cookie that clears `name` in the browser.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Could not encode cookie"),
    }
}

/// Session middleware.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let current = match jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.get(c.value()))
    {
        Some(session) => CurrentSession {
            session,
            is_new: false,
        },
        None => CurrentSession {
            session: state.sessions.create(),
            is_new: true,
        },
    };
    let session_id = current.session.id.clone();
    let is_new = current.is_new;
    req.extensions_mut().insert(current);

    let mut response = next.run(req).await;
    let secure = state.config.auth.secure_cookies;

    let (session, set_cookie) = match response.extensions_mut().remove::<SessionChange>() {
        Some(SessionChange::Rotated(session)) => (Some(session), true),
        Some(SessionChange::Ended) => {
            append_cookie(&mut response, &removal_cookie(SESSION_COOKIE));
            (None, false)
        }
        // The handler may have destroyed the session (deactivated user).
        None => (state.sessions.get(&session_id), is_new),
    };

    if let Some(session) = session {
        if set_cookie {
            append_cookie(
                &mut response,
                &site_cookie(SESSION_COOKIE, session.id.clone(), secure),
            );
        }
        match state
            .csrf
            .issue(&session)
            .map(|token| HeaderValue::from_str(&token))
        {
            Ok(Ok(value)) => {
                response.headers_mut().insert(CSRF_HEADER, value);
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "Could not encode CSRF header"),
            Err(e) => tracing::warn!(error = %e, "Could not issue CSRF token"),
        }
    }

    response
}
