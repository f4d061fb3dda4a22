//! Board handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::can_write;
use crate::web::dto::{
    ApiResponse, BoardResponse, CreatePostRequest, PageQuery, PaginatedResponse, PostResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, OptionalAuthUser};
use crate::web::state::AppState;

/// GET /boards - List all boards with their stats.
pub async fn list_boards(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
) -> Result<Json<ApiResponse<Vec<BoardResponse>>>, ApiError> {
    let boards = state.boards().list_boards().await?;

    let responses = boards
        .into_iter()
        .map(|stats| {
            let writable = can_write(user.as_ref(), &stats.board);
            BoardResponse::with_stats(stats, writable)
        })
        .collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// GET /boards/:slug - Get board details.
pub async fn get_board(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let board = state.boards().get_board(&slug).await?;
    let writable = can_write(user.as_ref(), &board);
    Ok(Json(ApiResponse::new(BoardResponse::new(board, writable))))
}

/// GET /boards/:slug/posts - List posts on a board, newest first.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<PostResponse>>, ApiError> {
    let page = state.boards().list_posts(&slug, query.page()).await?;
    Ok(Json(PaginatedResponse::from_page(page, PostResponse::from)))
}

/// POST /boards/:slug/posts - Create a post.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    let post = state
        .boards()
        .create_post(&slug, &user, &req.title, &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(post.into()))))
}
