//! Comment handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, CommentResponse, CreateCommentRequest, UpdateCommentRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// GET /posts/:id/comments - Comments as a two-level tree.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let threads = state.boards().list_comments(post_id).await?;
    Ok(Json(ApiResponse::new(
        threads.into_iter().map(Into::into).collect(),
    )))
}

/// POST /posts/:id/comments - Comment on a post or reply to a comment.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), ApiError> {
    let comment = state
        .boards()
        .create_comment(post_id, &user, &req.body, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(comment.into()))))
}

/// PUT /comments/:id - Edit a comment (author or admin).
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    let comment = state
        .boards()
        .update_comment(comment_id, &user, &req.body)
        .await?;
    Ok(Json(ApiResponse::new(comment.into())))
}

/// DELETE /comments/:id - Delete a comment that has no replies.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.boards().delete_comment(comment_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
