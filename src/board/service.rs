//! Board service for AIZEVA.
//!
//! This module provides high-level operations for boards, posts and
//! comments with built-in permission checking, sanitization and pagination.

use tracing::{debug, info};

use crate::auth::{can_moderate, require_moderate, require_write};
use crate::db::{Database, User};
use crate::{AizevaError, Result};

use super::comment::{Comment, CommentThread, NewComment};
use super::comment_repository::CommentRepository;
use super::post::{LatestPost, NewPost, Post, PostUpdate};
use super::post_repository::PostRepository;
use super::repository::BoardRepository;
use super::sanitize::{preview, sanitize_comment_body, sanitize_post_body, strip_tags};
use super::types::{Board, BoardWithStats};

/// Maximum length for post titles (in characters).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Posts per page on board listings and search.
pub const POSTS_PER_PAGE: i64 = 10;

/// Default number of posts in the latest-posts listing.
pub const DEFAULT_LATEST_LIMIT: i64 = 5;

/// Maximum number of posts in the latest-posts listing.
pub const MAX_LATEST_LIMIT: i64 = 20;

/// Strip and validate a title.
fn clean_title(title: &str) -> Result<String> {
    let title = strip_tags(title).trim().to_string();
    if title.is_empty() {
        return Err(AizevaError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AizevaError::Validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title)
}

/// Sanitize and validate a post body.
fn clean_post_body(body: &str) -> Result<String> {
    let body = sanitize_post_body(body);
    if body.trim().is_empty() {
        return Err(AizevaError::Validation("content is required".to_string()));
    }
    Ok(body)
}

/// Sanitize and validate a comment body.
fn clean_comment_body(body: &str) -> Result<String> {
    let body = sanitize_comment_body(body);
    if body.trim().is_empty() {
        return Err(AizevaError::Validation(
            "comment content is required".to_string(),
        ));
    }
    Ok(body)
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items (across all pages).
    pub total: i64,
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub per_page: i64,
}

impl<T> PaginatedResult<T> {
    /// Number of pages, at least 1.
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 1;
        }
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    /// Check if there are more items after this page.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Offset for a 1-based page, rejecting pages below 1.
///
/// `None` means the offset does not fit in an `i64`; such a page lies past
/// every row and is served empty.
pub(crate) fn page_offset(page: i64, per_page: i64) -> Result<Option<i64>> {
    if page < 1 {
        return Err(AizevaError::Validation(
            "page must be at least 1".to_string(),
        ));
    }
    Ok(page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(per_page)))
}

/// What the caller may do with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostPermissions {
    /// Caller may edit the post.
    pub can_edit: bool,
    /// Caller may delete the post.
    pub can_delete: bool,
}

/// Service for board, post and comment operations.
pub struct BoardService<'a> {
    db: &'a Database,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Boards
    // ------------------------------------------------------------------

    /// List all boards with their post and comment counts.
    pub async fn list_boards(&self) -> Result<Vec<BoardWithStats>> {
        BoardRepository::new(self.db.pool()).list_with_stats().await
    }

    /// Get a board by slug.
    pub async fn get_board(&self, slug: &str) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AizevaError::NotFound("board".to_string()))
    }

    async fn get_board_by_id(&self, id: i64) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("board".to_string()))
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    /// List a board's posts, newest first, [`POSTS_PER_PAGE`] per page.
    ///
    /// A page past the end is empty but still reports the total.
    pub async fn list_posts(&self, slug: &str, page: i64) -> Result<PaginatedResult<Post>> {
        let offset = page_offset(page, POSTS_PER_PAGE)?;
        let board = self.get_board(slug).await?;

        let repo = PostRepository::new(self.db.pool());
        let total = repo.count_by_board(board.id).await?;
        let items = match offset {
            Some(offset) => repo.list_by_board(board.id, offset, POSTS_PER_PAGE).await?,
            None => Vec::new(),
        };

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page: POSTS_PER_PAGE,
        })
    }

    /// Get a post without counting a view.
    pub async fn peek_post(&self, id: i64) -> Result<Post> {
        PostRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("post".to_string()))
    }

    /// Get a post and count one view.
    ///
    /// The returned post carries the incremented view count.
    pub async fn get_post(&self, id: i64) -> Result<Post> {
        let repo = PostRepository::new(self.db.pool());
        let view_count = repo
            .increment_view_count(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("post".to_string()))?;

        let mut post = self.peek_post(id).await?;
        post.view_count = view_count;
        Ok(post)
    }

    /// Create a post on the board `slug`.
    pub async fn create_post(
        &self,
        slug: &str,
        author: &User,
        title: &str,
        body: &str,
    ) -> Result<Post> {
        let board = self.get_board(slug).await?;
        require_write(Some(author), &board)?;

        let title = clean_title(title)?;
        let body = clean_post_body(body)?;

        let post = PostRepository::new(self.db.pool())
            .create(&NewPost::new(board.id, &author.id, title, body))
            .await?;

        info!(post_id = post.id, board = %board.slug, author = %author.id, "Post created");
        Ok(post)
    }

    /// Update a post. Only the author or an admin may do this.
    pub async fn update_post(&self, id: i64, actor: &User, update: PostUpdate) -> Result<Post> {
        if update.is_empty() {
            return Err(AizevaError::Validation("nothing to update".to_string()));
        }

        let post = self.peek_post(id).await?;
        require_moderate(actor, &post)?;

        let mut clean = PostUpdate::new();
        if let Some(title) = update.title.as_deref() {
            clean = clean.title(clean_title(title)?);
        }
        if let Some(body) = update.body.as_deref() {
            clean = clean.body(clean_post_body(body)?);
        }

        let updated = PostRepository::new(self.db.pool())
            .update(id, &clean)
            .await?
            .ok_or_else(|| AizevaError::NotFound("post".to_string()))?;

        debug!(post_id = id, actor = %actor.id, "Post updated");
        Ok(updated)
    }

    /// Delete a post and its comments. Only the author or an admin may do this.
    pub async fn delete_post(&self, id: i64, actor: &User) -> Result<()> {
        let post = self.peek_post(id).await?;
        require_moderate(actor, &post)?;

        if !PostRepository::new(self.db.pool()).delete(id).await? {
            return Err(AizevaError::NotFound("post".to_string()));
        }

        info!(post_id = id, actor = %actor.id, "Post deleted");
        Ok(())
    }

    /// Edit/delete rights of `user` (None = anonymous) on a post.
    pub async fn post_permissions(&self, id: i64, user: Option<&User>) -> Result<PostPermissions> {
        let post = self.peek_post(id).await?;
        let allowed = user.is_some_and(|u| can_moderate(u, &post));
        Ok(PostPermissions {
            can_edit: allowed,
            can_delete: allowed,
        })
    }

    /// Search post titles and bodies.
    ///
    /// `board_slugs` restricts the search; an unknown slug is an error
    /// rather than being silently ignored.
    pub async fn search(
        &self,
        query: &str,
        board_slugs: &[String],
        page: i64,
    ) -> Result<PaginatedResult<Post>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AizevaError::Validation(
                "search query is required".to_string(),
            ));
        }
        let offset = page_offset(page, POSTS_PER_PAGE)?;

        let boards = BoardRepository::new(self.db.pool())
            .get_by_slugs(board_slugs)
            .await?;
        if let Some(missing) = board_slugs
            .iter()
            .find(|slug| !boards.iter().any(|b| &b.slug == *slug))
        {
            return Err(AizevaError::NotFound(format!("board '{missing}'")));
        }
        let board_ids: Vec<i64> = boards.iter().map(|b| b.id).collect();

        let repo = PostRepository::new(self.db.pool());
        let total = repo.count_search(query, &board_ids).await?;
        let items = match offset {
            Some(offset) => {
                repo.search(query, &board_ids, offset, POSTS_PER_PAGE)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page: POSTS_PER_PAGE,
        })
    }

    /// Latest posts across boards with a plain-text preview.
    ///
    /// `limit` defaults to [`DEFAULT_LATEST_LIMIT`] and is clamped to
    /// `1..=MAX_LATEST_LIMIT`.
    pub async fn latest_posts(&self, limit: Option<i64>) -> Result<Vec<LatestPost>> {
        let limit = limit
            .unwrap_or(DEFAULT_LATEST_LIMIT)
            .clamp(1, MAX_LATEST_LIMIT);

        let mut posts = PostRepository::new(self.db.pool()).latest(limit).await?;
        for post in &mut posts {
            post.preview = preview(&post.preview);
        }
        Ok(posts)
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// Comments on a post as a two-level tree.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentThread>> {
        self.peek_post(post_id).await?;
        let comments = CommentRepository::new(self.db.pool())
            .list_by_post(post_id)
            .await?;
        Ok(CommentThread::build(comments))
    }

    async fn get_comment(&self, id: i64) -> Result<Comment> {
        CommentRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("comment".to_string()))
    }

    /// Comment on a post, optionally replying to a top-level comment.
    ///
    /// The post's board tier applies. The parent must exist (else not
    /// found), belong to the same post and be top-level (else validation).
    pub async fn create_comment(
        &self,
        post_id: i64,
        author: &User,
        body: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment> {
        let post = self.peek_post(post_id).await?;
        let board = self.get_board_by_id(post.board_id).await?;
        require_write(Some(author), &board)?;

        let body = clean_comment_body(body)?;
        let mut new_comment = NewComment::new(post.id, &author.id, body);

        if let Some(parent_id) = parent_id {
            let parent = CommentRepository::new(self.db.pool())
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| AizevaError::NotFound("parent comment".to_string()))?;

            if parent.post_id != post.id {
                return Err(AizevaError::Validation(
                    "parent comment belongs to a different post".to_string(),
                ));
            }
            if !parent.is_top_level() {
                return Err(AizevaError::Validation(
                    "reply depth exceeded: replies cannot be replied to".to_string(),
                ));
            }
            new_comment = new_comment.reply_to(parent.id);
        }

        let comment = CommentRepository::new(self.db.pool())
            .create(&new_comment)
            .await?;

        debug!(comment_id = comment.id, post_id, author = %author.id, "Comment created");
        Ok(comment)
    }

    /// Edit a comment. Only the author or an admin may do this.
    pub async fn update_comment(&self, id: i64, actor: &User, body: &str) -> Result<Comment> {
        let comment = self.get_comment(id).await?;
        require_moderate(actor, &comment)?;

        let body = clean_comment_body(body)?;
        CommentRepository::new(self.db.pool())
            .update_body(id, &body)
            .await?
            .ok_or_else(|| AizevaError::NotFound("comment".to_string()))
    }

    /// Delete a comment. Only the author or an admin may do this.
    ///
    /// A comment that still has replies cannot be deleted.
    pub async fn delete_comment(&self, id: i64, actor: &User) -> Result<()> {
        let comment = self.get_comment(id).await?;
        require_moderate(actor, &comment)?;

        let repo = CommentRepository::new(self.db.pool());
        if repo.delete_if_no_replies(id).await? {
            info!(comment_id = id, actor = %actor.id, "Comment deleted");
            return Ok(());
        }

        if repo.count_replies(id).await? > 0 {
            return Err(AizevaError::Conflict(
                "comment has replies; delete the replies first".to_string(),
            ));
        }
        Err(AizevaError::NotFound("comment".to_string()))
    }
}
