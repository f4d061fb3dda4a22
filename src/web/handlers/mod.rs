//! API handlers for the Web API.

pub mod admin;
pub mod auth;
pub mod board;
pub mod comment;
pub mod post;

use axum::Json;

use crate::web::dto::HealthResponse;

pub use admin::*;
pub use auth::*;
pub use board::*;
pub use comment::*;
pub use post::*;

/// GET /health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
