//! Web API module for AIZEVA.
//!
//! A JSON API over boards, posts, comments and the admin console. Browser
//! clients are tracked by a session cookie; every mutating request carries
//! that session's CSRF token.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
pub use state::AppState;
