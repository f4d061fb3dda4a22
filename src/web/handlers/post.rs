//! Post and search handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::board::PostUpdate;
use crate::web::dto::{
    ApiResponse, LatestPostResponse, LatestQuery, PaginatedResponse, PermissionsResponse,
    PostResponse, SearchQuery, UpdatePostRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, OptionalAuthUser};
use crate::web::state::AppState;

/// GET /posts/latest - Latest posts across all boards.
pub async fn latest_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<ApiResponse<Vec<LatestPostResponse>>>, ApiError> {
    let posts = state.boards().latest_posts(query.limit).await?;
    Ok(Json(ApiResponse::new(
        posts.into_iter().map(Into::into).collect(),
    )))
}

/// GET /posts/:id - Get a post, counting the view.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = state.boards().get_post(post_id).await?;
    Ok(Json(ApiResponse::new(post.into())))
}

/// PUT /posts/:id - Update a post (author or admin).
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let mut update = PostUpdate::new();
    if let Some(title) = req.title {
        update = update.title(title);
    }
    if let Some(body) = req.body {
        update = update.body(body);
    }

    let post = state.boards().update_post(post_id, &user, update).await?;
    Ok(Json(ApiResponse::new(post.into())))
}

/// DELETE /posts/:id - Delete a post with its comments.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.boards().delete_post(post_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/:id/permissions - What the caller may do with a post.
pub async fn post_permissions(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<PermissionsResponse>>, ApiError> {
    let permissions = state
        .boards()
        .post_permissions(post_id, user.as_ref())
        .await?;
    Ok(Json(ApiResponse::new(permissions.into())))
}

/// GET /search - Search post titles and bodies.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PaginatedResponse<PostResponse>>, ApiError> {
    let page = state
        .boards()
        .search(&query.q, &query.board_slugs(), query.page.unwrap_or(1))
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, PostResponse::from)))
}
