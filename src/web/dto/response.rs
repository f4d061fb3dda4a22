//! Response DTOs for Web API.

use serde::Serialize;

use crate::admin::{BulkOutcome, ContentCounts, RemovalOutcome, SiteStats, UserDetail};
use crate::board::{
    Board, BoardWithStats, Comment, CommentThread, LatestPost, PaginatedResult, Post,
    PostPermissions, WritePermission,
};
use crate::db::User;

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Convert one page of domain items.
    pub fn from_page<U>(page: PaginatedResult<U>, convert: impl FnMut(U) -> T) -> Self {
        let meta = PaginationMeta {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
        };
        Self {
            data: page.items.into_iter().map(convert).collect(),
            meta,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: i64,
    /// Items per page.
    pub per_page: i64,
    /// Total number of items.
    pub total: i64,
    /// Number of pages, at least 1.
    pub total_pages: i64,
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Admin flag.
    pub is_admin: bool,
    /// Account creation timestamp.
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// CSRF token for the new session.
    pub csrf_token: String,
    /// User information.
    pub user: UserInfo,
}

/// CSRF token response.
#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    /// Token to echo back on mutating requests.
    pub csrf_token: String,
}

// ============================================================================
// Board DTOs
// ============================================================================

/// Board response.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    /// Board ID.
    pub id: i64,
    /// URL slug.
    pub slug: String,
    /// Board name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Write tier.
    pub write_permission: WritePermission,
    /// Number of posts, in listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_count: Option<i64>,
    /// Number of comments, in listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<i64>,
    /// Whether the caller may post here.
    pub can_write: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl BoardResponse {
    /// Build from a board, without stats.
    pub fn new(board: Board, can_write: bool) -> Self {
        Self {
            id: board.id,
            slug: board.slug,
            name: board.name,
            description: board.description,
            write_permission: board.write_permission,
            post_count: None,
            comment_count: None,
            can_write,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }

    /// Build from a listing row.
    pub fn with_stats(stats: BoardWithStats, can_write: bool) -> Self {
        Self {
            post_count: Some(stats.post_count),
            comment_count: Some(stats.comment_count),
            ..Self::new(stats.board, can_write)
        }
    }
}

/// Author info in responses.
#[derive(Debug, Serialize)]
pub struct AuthorInfo {
    /// Author ID.
    pub id: String,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: Option<String>,
}

/// Post response.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: i64,
    /// Board ID.
    pub board_id: i64,
    /// Author info.
    pub author: AuthorInfo,
    /// Title.
    pub title: String,
    /// Sanitized body.
    pub body: String,
    /// View count.
    pub view_count: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            board_id: post.board_id,
            author: AuthorInfo {
                id: post.author_id,
                username: post.author_username,
                display_name: post.author_display_name,
            },
            title: post.title,
            body: post.body,
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Latest-posts entry.
#[derive(Debug, Serialize)]
pub struct LatestPostResponse {
    /// Post ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Plain-text preview.
    pub preview: String,
    /// View count.
    pub view_count: i64,
    /// Comment count.
    pub comment_count: i64,
    /// Board slug.
    pub board_slug: String,
    /// Board name.
    pub board_name: String,
    /// Author's username.
    pub author_username: String,
    /// Author's display name.
    pub author_display_name: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<LatestPost> for LatestPostResponse {
    fn from(post: LatestPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            preview: post.preview,
            view_count: post.view_count,
            comment_count: post.comment_count,
            board_slug: post.board_slug,
            board_name: post.board_name,
            author_username: post.author_username,
            author_display_name: post.author_display_name,
            created_at: post.created_at,
        }
    }
}

/// What the caller may do with a post.
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    /// May edit.
    pub can_edit: bool,
    /// May delete.
    pub can_delete: bool,
}

impl From<PostPermissions> for PermissionsResponse {
    fn from(p: PostPermissions) -> Self {
        Self {
            can_edit: p.can_edit,
            can_delete: p.can_delete,
        }
    }
}

/// Comment response. Top-level comments in a tree carry their replies.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    /// Comment ID.
    pub id: i64,
    /// Post ID.
    pub post_id: i64,
    /// Parent comment, null for top-level.
    pub parent_id: Option<i64>,
    /// Author info.
    pub author: AuthorInfo,
    /// Sanitized body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Replies, only in tree listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentResponse>>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            author: AuthorInfo {
                id: comment.author_id,
                username: comment.author_username,
                display_name: comment.author_display_name,
            },
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            replies: None,
        }
    }
}

impl From<CommentThread> for CommentResponse {
    fn from(thread: CommentThread) -> Self {
        Self {
            replies: Some(thread.replies.into_iter().map(Into::into).collect()),
            ..thread.comment.into()
        }
    }
}

// ============================================================================
// Admin DTOs
// ============================================================================

/// User row in the admin console.
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    /// Profile.
    #[serde(flatten)]
    pub user: UserInfo,
    /// Deactivation timestamp.
    pub deleted_at: Option<String>,
    /// Number of posts.
    pub post_count: i64,
    /// Number of comments.
    pub comment_count: i64,
}

impl From<UserDetail> for AdminUserResponse {
    fn from(detail: UserDetail) -> Self {
        let deleted_at = detail.user.deleted_at.clone();
        Self {
            user: detail.user.into(),
            deleted_at,
            post_count: detail.post_count,
            comment_count: detail.comment_count,
        }
    }
}

/// Result of removing a user.
#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    /// `deleted` or `deactivated`.
    pub outcome: &'static str,
    /// The removed user.
    pub user_id: String,
    /// Name now shown on the user's content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_username: Option<String>,
}

impl From<RemovalOutcome> for RemovalResponse {
    fn from(outcome: RemovalOutcome) -> Self {
        match outcome {
            RemovalOutcome::Deleted { user_id } => Self {
                outcome: "deleted",
                user_id,
                placeholder_username: None,
            },
            RemovalOutcome::Deactivated {
                user_id,
                placeholder_username,
            } => Self {
                outcome: "deactivated",
                user_id,
                placeholder_username: Some(placeholder_username),
            },
        }
    }
}

/// Content written by a user, and what removing them would do.
#[derive(Debug, Serialize)]
pub struct ContentCheckResponse {
    /// Checked user.
    pub user_id: String,
    /// Whether removal would deactivate rather than delete.
    pub has_content: bool,
    /// Posts authored.
    pub posts_count: i64,
    /// Comments authored, replies included.
    pub comments_count: i64,
    /// Replies authored.
    pub replies_count: i64,
    /// Distinct posts commented on.
    pub participated_posts_count: i64,
    /// `delete` or `deactivate`.
    pub removal: &'static str,
}

impl ContentCheckResponse {
    /// Describe `counts` for `user_id`.
    pub fn new(user_id: impl Into<String>, counts: ContentCounts) -> Self {
        let has_content = counts.has_content();
        Self {
            user_id: user_id.into(),
            has_content,
            posts_count: counts.posts,
            comments_count: counts.top_level_comments + counts.replies,
            replies_count: counts.replies,
            participated_posts_count: counts.participated_posts,
            removal: if has_content { "deactivate" } else { "delete" },
        }
    }
}

/// One refused id in a bulk operation.
#[derive(Debug, Serialize)]
pub struct BulkErrorResponse {
    /// Target user id.
    pub user_id: String,
    /// Reason.
    pub message: String,
}

/// Per-id results of a bulk operation.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    /// Number of ids applied.
    pub success_count: usize,
    /// Number of ids refused.
    pub failed_count: usize,
    /// Applied ids.
    pub succeeded: Vec<String>,
    /// Refused ids with reasons.
    pub errors: Vec<BulkErrorResponse>,
}

impl From<BulkOutcome> for BulkResponse {
    fn from(outcome: BulkOutcome) -> Self {
        Self {
            success_count: outcome.succeeded.len(),
            failed_count: outcome.failed.len(),
            succeeded: outcome.succeeded,
            errors: outcome
                .failed
                .into_iter()
                .map(|f| BulkErrorResponse {
                    user_id: f.user_id,
                    message: f.reason,
                })
                .collect(),
        }
    }
}

/// Site totals.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Active users.
    pub active_users: i64,
    /// Active admins.
    pub admins: i64,
    /// Posts.
    pub posts: i64,
    /// Comments.
    pub comments: i64,
    /// Boards.
    pub boards: i64,
}

impl From<SiteStats> for StatsResponse {
    fn from(s: SiteStats) -> Self {
        Self {
            active_users: s.active_users,
            admins: s.admins,
            posts: s.posts,
            comments: s.comments,
            boards: s.boards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            post_id: 1,
            author_id: "u1".to_string(),
            author_username: "alice".to_string(),
            author_display_name: None,
            parent_id,
            body: "<p>hi</p>".to_string(),
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_paginated_meta() {
        let page = PaginatedResult {
            items: vec![1, 2, 3, 4, 5],
            total: 25,
            page: 3,
            per_page: 10,
        };
        let response = PaginatedResponse::from_page(page, |n| n * 2);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"], serde_json::json!([2, 4, 6, 8, 10]));
        assert_eq!(json["meta"]["total"], 25);
        assert_eq!(json["meta"]["total_pages"], 3);
        assert_eq!(json["meta"]["page"], 3);
    }

    #[test]
    fn test_comment_tree_shape() {
        let thread = CommentThread {
            comment: sample_comment(1, None),
            replies: vec![sample_comment(2, Some(1))],
        };
        let json = serde_json::to_value(CommentResponse::from(thread)).unwrap();
        assert_eq!(json["replies"][0]["parent_id"], 1);
        assert!(json["replies"][0].get("replies").is_none());
        assert!(json["parent_id"].is_null());
    }

    #[test]
    fn test_removal_response() {
        let json = serde_json::to_value(RemovalResponse::from(RemovalOutcome::Deactivated {
            user_id: "u1".to_string(),
            placeholder_username: "[deleted user]".to_string(),
        }))
        .unwrap();
        assert_eq!(json["outcome"], "deactivated");
        assert_eq!(json["placeholder_username"], "[deleted user]");

        let json = serde_json::to_value(RemovalResponse::from(RemovalOutcome::Deleted {
            user_id: "u2".to_string(),
        }))
        .unwrap();
        assert_eq!(json["outcome"], "deleted");
        assert!(json.get("placeholder_username").is_none());
    }

    #[test]
    fn test_content_check_response() {
        let counts = ContentCounts {
            posts: 1,
            top_level_comments: 2,
            replies: 3,
            participated_posts: 2,
        };
        let json = serde_json::to_value(ContentCheckResponse::new("u1", counts)).unwrap();
        assert_eq!(json["comments_count"], 5);
        assert_eq!(json["replies_count"], 3);
        assert_eq!(json["removal"], "deactivate");

        let json =
            serde_json::to_value(ContentCheckResponse::new("u2", ContentCounts::default())).unwrap();
        assert_eq!(json["has_content"], false);
        assert_eq!(json["removal"], "delete");
    }
}
