//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use super::handlers::{
    bulk_delete_users, bulk_demote_users, bulk_promote_users, create_board, create_comment,
    create_post, csrf_token, delete_board, delete_comment, delete_post, demote_user, get_board,
    get_post, get_user, health, latest_posts, list_boards, list_comments, list_posts, list_users,
    login, logout, me, post_permissions, promote_user, remove_user, search, signup, stats,
    update_board, update_comment, update_post, user_content_check,
};
use super::middleware::{
    create_cors_layer, csrf_protect, login_rate_limit, security_headers, session_layer,
    LoginRateLimiter,
};
use super::state::AppState;

/// Create the main API router.
///
/// Requests pass through tracing, CORS, compression, security headers,
/// the session layer and the CSRF check, in that order.
pub fn create_router(app_state: Arc<AppState>, login_limiter: Arc<LoginRateLimiter>) -> Router {
    let auth_routes = Router::new()
        .route("/csrf-token", get(csrf_token))
        .route("/signup", post(signup))
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(
                login_limiter,
                login_rate_limit,
            )),
        )
        .route("/logout", post(logout))
        .route("/me", get(me));

    let content_routes = Router::new()
        .route("/boards", get(list_boards))
        .route("/boards/:slug", get(get_board))
        .route("/boards/:slug/posts", get(list_posts).post(create_post))
        .route("/posts/latest", get(latest_posts))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/permissions", get(post_permissions))
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/:id", put(update_comment).delete(delete_comment))
        .route("/search", get(search));

    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(remove_user))
        .route("/users/:id/promote", put(promote_user))
        .route("/users/:id/demote", put(demote_user))
        .route("/users/:id/content-check", get(user_content_check))
        .route("/users/bulk-delete", post(bulk_delete_users))
        .route("/users/bulk-promote", post(bulk_promote_users))
        .route("/users/bulk-demote", post(bulk_demote_users))
        .route("/stats", get(stats))
        .route("/boards", post(create_board))
        .route("/boards/:id", put(update_board).delete(delete_board));

    let cors = create_cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .merge(content_routes)
        .nest("/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    session_layer,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    csrf_protect,
                )),
        )
        .with_state(app_state)
}
