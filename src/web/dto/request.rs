//! Request DTOs for Web API.
//!
//! Field rules here are coarse input guards; the services enforce the
//! precise policies.

use serde::Deserialize;
use validator::Validate;

use super::validation::no_control_chars;
use crate::board::WritePermission;

// ============================================================================
// Auth
// ============================================================================

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address.
    #[validate(length(max = 254))]
    pub email: String,
    /// Username.
    #[validate(length(max = 64), custom(function = "no_control_chars"))]
    pub username: String,
    /// Password.
    #[validate(length(max = 1024))]
    pub password: String,
    /// Password confirmation, must equal `password`.
    #[validate(length(max = 1024))]
    pub password_confirm: String,
    /// Display name (optional).
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(max = 254))]
    pub email: String,
    /// Password.
    #[validate(length(max = 1024))]
    pub password: String,
}

// ============================================================================
// Posts and comments
// ============================================================================

/// Create post request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Title (plain text).
    #[validate(custom(function = "no_control_chars"))]
    pub title: String,
    /// Body (rich text, sanitized on write).
    pub body: String,
}

/// Update post request. At least one field must be set.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New body.
    #[serde(default)]
    pub body: Option<String>,
}

/// Create comment request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Body (rich text, sanitized on write).
    pub body: String,
    /// Top-level comment this replies to.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Update comment request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    /// New body.
    pub body: String,
}

// ============================================================================
// Admin
// ============================================================================

/// Create board request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    /// URL slug.
    pub slug: String,
    /// Board name.
    #[validate(custom(function = "no_control_chars"))]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Write tier (`all`, `member`, `admin`).
    #[serde(default)]
    pub write_permission: Option<WritePermission>,
}

/// Update board request. The slug cannot be changed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New write tier.
    #[serde(default)]
    pub write_permission: Option<WritePermission>,
}

/// Bulk promote, demote or delete request.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkUsersRequest {
    /// Target user ids.
    #[validate(length(min = 1, max = 100))]
    pub user_ids: Vec<String>,
}

// ============================================================================
// Query strings
// ============================================================================

/// `?page=` for paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page, defaults to 1.
    pub page: Option<i64>,
}

impl PageQuery {
    /// The requested page.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// `GET /search` query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Search term.
    #[serde(default)]
    pub q: String,
    /// Comma-separated board slugs.
    pub board: Option<String>,
    /// 1-based page.
    pub page: Option<i64>,
}

impl SearchQuery {
    /// Board slugs named in `board`, empty for all boards.
    pub fn board_slugs(&self) -> Vec<String> {
        self.board
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `GET /posts/latest` query.
#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    /// How many posts, clamped by the service.
    pub limit: Option<i64>,
}

/// `GET /admin/users` query.
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    /// 1-based page.
    pub page: Option<i64>,
    /// Page size.
    pub per_page: Option<i64>,
    /// Substring of username or email.
    pub q: Option<String>,
    /// `all`, `admin` or `member`.
    pub role: Option<String>,
    /// Include deactivated users.
    #[serde(default)]
    pub include_deleted: bool,
}
