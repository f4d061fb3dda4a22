//! Middleware for the Web API.

pub mod auth;
pub mod cors;
pub mod csrf;
pub mod rate_limit;
pub mod security;
pub mod session;

pub use auth::{AuthUser, OptionalAuthUser, ACCESS_TOKEN_COOKIE};
pub use cors::create_cors_layer;
pub use csrf::csrf_protect;
pub use rate_limit::{login_rate_limit, LoginRateLimiter};
pub use security::security_headers;
pub use session::{
    removal_cookie, session_layer, site_cookie, CurrentSession, SessionChange, SESSION_COOKIE,
};
