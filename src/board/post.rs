//! Post model for AIZEVA.

use crate::auth::Authored;

/// Post entity, joined with its author's public name.
///
/// A deactivated author keeps the placeholder username, so posts by
/// removed users still resolve.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    /// Unique post ID.
    pub id: i64,
    /// ID of the board this post belongs to.
    pub board_id: i64,
    /// ID of the author.
    pub author_id: String,
    /// Author's username.
    pub author_username: String,
    /// Author's display name, if set.
    pub author_display_name: Option<String>,
    /// Plain-text title.
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

impl Post {
    /// Name to show for the author.
    pub fn author_name(&self) -> &str {
        self.author_display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.author_username)
    }
}

impl Authored for Post {
    fn author_id(&self) -> &str {
        &self.author_id
    }
}

/// Summary row for the cross-board "latest posts" listing.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LatestPost {
    /// Post ID.
    pub id: i64,
    /// Plain-text title.
    pub title: String,
    /// Plain-text preview of the body.
    pub preview: String,
    /// View count.
    pub view_count: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Board slug.
    pub board_slug: String,
    /// Board name.
    pub board_name: String,
    /// Author's username.
    pub author_username: String,
    /// Author's display name, if set.
    pub author_display_name: Option<String>,
    /// Number of comments on the post.
    pub comment_count: i64,
}

/// Data for creating a new post. Title and body are stored as given, so
/// callers sanitize first.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// ID of the board.
    pub board_id: i64,
    /// ID of the author.
    pub author_id: String,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
}

impl NewPost {
    /// Create a new post with required fields.
    pub fn new(
        board_id: i64,
        author_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            board_id,
            author_id: author_id.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Data for updating an existing post.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub body: Option<String>,
}

impl PostUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set new body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}
