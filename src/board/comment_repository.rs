//! Comment repository for AIZEVA.

use super::comment::{Comment, NewComment};
use crate::db::{DbPool, SQL_NOW};
use crate::{AizevaError, Result};

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id,
        u.username AS author_username, u.display_name AS author_display_name,
        c.parent_id, c.body, c.created_at, c.updated_at
     FROM comments c JOIN users u ON u.id = c.author_id";

/// Repository for comment CRUD operations.
pub struct CommentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new CommentRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a comment. Tree rules are checked by the caller.
    pub async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (post_id, author_id, parent_id, body)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(new_comment.post_id)
        .bind(&new_comment.author_id)
        .bind(new_comment.kind.parent_id())
        .bind(&new_comment.body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("comment".to_string()))
    }

    /// Get a comment by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// List all comments on a post in creation order.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at, c.id");
        sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Replace a comment's body.
    pub async fn update_body(&self, id: i64, body: &str) -> Result<Option<Comment>> {
        let sql = format!("UPDATE comments SET body = $1, updated_at = {SQL_NOW} WHERE id = $2");
        let result = sqlx::query(&sql)
            .bind(body)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a comment unless it has replies.
    ///
    /// The reply check and the delete are one statement, so a reply added
    /// concurrently either lands first (and blocks the delete) or fails its
    /// parent foreign key. Returns true if the row was deleted.
    pub async fn delete_if_no_replies(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $1
             AND NOT EXISTS (SELECT 1 FROM comments r WHERE r.parent_id = $1)",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count replies to a comment.
    pub async fn count_replies(&self, id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count all comments.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::board::{BoardRepository, NewBoard, NewPost, PostRepository};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup_db() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        UserRepository::new(db.pool())
            .create(&NewUser::new("u1", "u1@example.com", "alice"))
            .await
            .unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new("free", "Free"))
            .await
            .unwrap();
        let post = PostRepository::new(db.pool())
            .create(&NewPost::new(board.id, "u1", "t", "b"))
            .await
            .unwrap();
        (db, post.id)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (db, post_id) = setup_db().await;
        let repo = CommentRepository::new(db.pool());

        let top = repo.create(&NewComment::new(post_id, "u1", "top")).await.unwrap();
        let reply = repo
            .create(&NewComment::new(post_id, "u1", "reply").reply_to(top.id))
            .await
            .unwrap();

        assert!(top.is_top_level());
        assert_eq!(reply.parent_id, Some(top.id));
        assert_eq!(reply.author_username, "alice");

        let all = repo.list_by_post(post_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, top.id);
        assert_eq!(repo.count_replies(top.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_replies() {
        let (db, post_id) = setup_db().await;
        let repo = CommentRepository::new(db.pool());
        let top = repo.create(&NewComment::new(post_id, "u1", "top")).await.unwrap();
        let reply = repo
            .create(&NewComment::new(post_id, "u1", "reply").reply_to(top.id))
            .await
            .unwrap();

        assert!(!repo.delete_if_no_replies(top.id).await.unwrap());
        assert!(repo.delete_if_no_replies(reply.id).await.unwrap());
        assert!(repo.delete_if_no_replies(top.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_post_delete_cascades() {
        let (db, post_id) = setup_db().await;
        let repo = CommentRepository::new(db.pool());
        let top = repo.create(&NewComment::new(post_id, "u1", "top")).await.unwrap();
        repo.create(&NewComment::new(post_id, "u1", "reply").reply_to(top.id))
            .await
            .unwrap();

        PostRepository::new(db.pool()).delete(post_id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_body() {
        let (db, post_id) = setup_db().await;
        let repo = CommentRepository::new(db.pool());
        let c = repo.create(&NewComment::new(post_id, "u1", "old")).await.unwrap();

        let updated = repo.update_body(c.id, "new").await.unwrap().unwrap();
        assert_eq!(updated.body, "new");
        assert!(repo.update_body(999, "x").await.unwrap().is_none());
    }
}
