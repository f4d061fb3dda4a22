//! Post repository for AIZEVA.
//!
//! This module provides CRUD, listing and search queries for posts.

use sqlx::QueryBuilder;

use super::post::{LatestPost, NewPost, Post, PostUpdate};
use crate::db::{like_pattern, DbBackend, DbPool, LIKE_ESCAPE, SQL_NOW};
use crate::{AizevaError, Result};

const POST_SELECT: &str = "SELECT p.id, p.board_id, p.author_id,
        u.username AS author_username, u.display_name AS author_display_name,
        p.title, p.body, p.view_count, p.created_at, p.updated_at
     FROM posts p JOIN users u ON u.id = p.author_id";

/// Repository for post CRUD operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post.
    ///
    /// Returns the created post with the assigned ID.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (board_id, author_id, title, body)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(new_post.board_id)
        .bind(&new_post.author_id)
        .bind(&new_post.title)
        .bind(&new_post.body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("post".to_string()))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Increment the view count by one and return the new value.
    ///
    /// Runs as a single statement so concurrent readers never lose an
    /// increment. Returns None if the post does not exist.
    pub async fn increment_view_count(&self, id: i64) -> Result<Option<i64>> {
        sqlx::query_scalar(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Update a post by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated post, or None if not found.
    pub async fn update(&self, id: i64, update: &PostUpdate) -> Result<Option<Post>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = query.separated(", ");

        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(ref body) = update.body {
            separated.push("body = ");
            separated.push_bind_unseparated(body);
        }
        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a post by ID. Comments cascade.
    ///
    /// Returns true if a post was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List posts on a board, newest first, ties broken by ID descending.
    pub async fn list_by_board(&self, board_id: i64, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "{POST_SELECT} WHERE p.board_id = $1
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(board_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count posts on a board.
    pub async fn count_by_board(&self, board_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE board_id = $1")
            .bind(board_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count all posts.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    fn push_search_filters<'q>(
        query: &mut QueryBuilder<'q, DbBackend>,
        pattern: &'q str,
        board_ids: &'q [i64],
    ) {
        query.push(" WHERE (LOWER(p.title) LIKE ");
        query.push_bind(pattern);
        query.push(LIKE_ESCAPE);
        query.push(" OR LOWER(p.body) LIKE ");
        query.push_bind(pattern);
        query.push(LIKE_ESCAPE);
        query.push(")");

        if !board_ids.is_empty() {
            query.push(" AND p.board_id IN (");
            let mut separated = query.separated(", ");
            for id in board_ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
    }

    /// Search titles and bodies case-insensitively, newest first.
    ///
    /// An empty `board_ids` searches every board.
    pub async fn search(
        &self,
        term: &str,
        board_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let pattern = like_pattern(term);
        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new(POST_SELECT);
        Self::push_search_filters(&mut query, &pattern, board_ids);
        query.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        query
            .build_query_as::<Post>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count search matches.
    pub async fn count_search(&self, term: &str, board_ids: &[i64]) -> Result<i64> {
        let pattern = like_pattern(term);
        let mut query: QueryBuilder<DbBackend> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        Self::push_search_filters(&mut query, &pattern, board_ids);

        query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Latest posts across all boards with board name and comment count.
    ///
    /// `preview` holds the full body; the service cuts it down.
    pub async fn latest(&self, limit: i64) -> Result<Vec<LatestPost>> {
        sqlx::query_as::<_, LatestPost>(
            "SELECT p.id, p.title, p.body AS preview, p.view_count, p.created_at,
                    b.slug AS board_slug, b.name AS board_name,
                    u.username AS author_username, u.display_name AS author_display_name,
                    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
             FROM posts p
             JOIN boards b ON b.id = p.board_id
             JOIN users u ON u.id = p.author_id
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))
    }
}
