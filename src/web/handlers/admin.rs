//! Admin handlers for Web API.
//!
//! Every handler requires an authenticated admin; the services check the
//! admin flag on the freshly loaded profile.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::admin::{CreateBoardRequest as NewBoardRequest, DEFAULT_USERS_PER_PAGE};
use crate::board::BoardUpdate;
use crate::db::{RoleFilter, UserListQuery};
use crate::web::dto::{
    AdminUserResponse, ApiResponse, BoardResponse, BulkResponse, BulkUsersRequest,
    ContentCheckResponse, CreateBoardRequest, PaginatedResponse, RemovalResponse, StatsResponse,
    UpdateBoardRequest, UserInfo, UserListParams, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

// ============================================================================
// User Management
// ============================================================================

/// GET /admin/users - List users with their content counts.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<PaginatedResponse<AdminUserResponse>>, ApiError> {
    let query = UserListQuery {
        search: params.q.filter(|q| !q.trim().is_empty()),
        role: params
            .role
            .as_deref()
            .map(RoleFilter::parse)
            .unwrap_or_default(),
        include_deleted: params.include_deleted,
    };

    let page = state
        .user_admin()
        .list_users(
            &admin,
            &query,
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(DEFAULT_USERS_PER_PAGE),
        )
        .await?;

    Ok(Json(PaginatedResponse::from_page(
        page,
        AdminUserResponse::from,
    )))
}

/// GET /admin/users/:id - User detail.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<AdminUserResponse>>, ApiError> {
    let detail = state.user_admin().get_user(&admin, &user_id).await?;
    Ok(Json(ApiResponse::new(detail.into())))
}

/// PUT /admin/users/:id/promote - Grant admin.
pub async fn promote_user(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.user_admin().promote(&admin, &user_id).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// PUT /admin/users/:id/demote - Revoke admin, keeping at least one admin.
pub async fn demote_user(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.user_admin().demote(&admin, &user_id).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// DELETE /admin/users/:id - Delete or deactivate a user.
pub async fn remove_user(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<RemovalResponse>>, ApiError> {
    let outcome = state.user_admin().remove(&admin, &user_id).await?;
    Ok(Json(ApiResponse::new(outcome.into())))
}

/// GET /admin/users/:id/content-check - What removing a user would do.
pub async fn user_content_check(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<ContentCheckResponse>>, ApiError> {
    let counts = state.user_admin().content_check(&admin, &user_id).await?;
    Ok(Json(ApiResponse::new(ContentCheckResponse::new(
        user_id, counts,
    ))))
}

/// POST /admin/users/bulk-promote - Grant admin to several users.
pub async fn bulk_promote_users(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    ValidatedJson(req): ValidatedJson<BulkUsersRequest>,
) -> Result<Json<ApiResponse<BulkResponse>>, ApiError> {
    let outcome = state
        .user_admin()
        .bulk_promote(&admin, &req.user_ids)
        .await?;
    Ok(Json(ApiResponse::new(outcome.into())))
}

/// POST /admin/users/bulk-demote - Revoke admin from several users.
pub async fn bulk_demote_users(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    ValidatedJson(req): ValidatedJson<BulkUsersRequest>,
) -> Result<Json<ApiResponse<BulkResponse>>, ApiError> {
    let outcome = state
        .user_admin()
        .bulk_demote(&admin, &req.user_ids)
        .await?;
    Ok(Json(ApiResponse::new(outcome.into())))
}

/// POST /admin/users/bulk-delete - Delete or deactivate several users.
pub async fn bulk_delete_users(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    ValidatedJson(req): ValidatedJson<BulkUsersRequest>,
) -> Result<Json<ApiResponse<BulkResponse>>, ApiError> {
    let outcome = state.user_admin().bulk_remove(&admin, &req.user_ids).await?;
    Ok(Json(ApiResponse::new(outcome.into())))
}

/// GET /admin/stats - Site totals.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let stats = state.user_admin().stats(&admin).await?;
    Ok(Json(ApiResponse::new(stats.into())))
}

// ============================================================================
// Board Management
// ============================================================================

/// POST /admin/boards - Create a board.
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBoardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardResponse>>), ApiError> {
    let request = NewBoardRequest {
        description: req.description,
        write_permission: req.write_permission,
        ..NewBoardRequest::new(req.slug, req.name)
    };

    let board = state.board_admin().create_board(request, &admin).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(BoardResponse::new(board, true))),
    ))
}

/// PUT /admin/boards/:id - Update a board's name, description or tier.
pub async fn update_board(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(board_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateBoardRequest>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let mut update = BoardUpdate::new();
    if let Some(name) = req.name {
        update = update.name(name);
    }
    if let Some(description) = req.description {
        update = update.description(description);
    }
    if let Some(permission) = req.write_permission {
        update = update.write_permission(permission);
    }

    let board = state
        .board_admin()
        .update_board(board_id, &update, &admin)
        .await?;
    Ok(Json(ApiResponse::new(BoardResponse::new(board, true))))
}

/// DELETE /admin/boards/:id - Delete a board and everything on it.
pub async fn delete_board(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(board_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.board_admin().delete_board(board_id, &admin).await?;
    Ok(StatusCode::NO_CONTENT)
}
