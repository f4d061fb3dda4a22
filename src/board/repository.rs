//! Board repository for AIZEVA.
//!
//! This module provides CRUD operations for boards in the database.

use sqlx::QueryBuilder;

use super::types::{Board, BoardUpdate, BoardWithStats, NewBoard};
use crate::db::{DbBackend, DbPool, SQL_NOW};
use crate::{AizevaError, Result};

const BOARD_COLUMNS: &str = "id, slug, name, description, write_permission, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BoardStatsRow {
    #[sqlx(flatten)]
    board: Board,
    post_count: i64,
    comment_count: i64,
}

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new board in the database.
    ///
    /// Returns the created board with the assigned ID.
    pub async fn create(&self, new_board: &NewBoard) -> Result<Board> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO boards (slug, name, description, write_permission)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&new_board.slug)
        .bind(&new_board.name)
        .bind(&new_board.description)
        .bind(new_board.write_permission.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1");
        sqlx::query_as::<_, Board>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Get a board by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE slug = $1");
        sqlx::query_as::<_, Board>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Check if a slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    /// Get several boards by slug. Unknown slugs are simply absent.
    pub async fn get_by_slugs(&self, slugs: &[String]) -> Result<Vec<Board>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new(format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE slug IN ("
        ));
        let mut separated = query.separated(", ");
        for slug in slugs {
            separated.push_bind(slug.as_str());
        }
        separated.push_unseparated(") ORDER BY id");

        query
            .build_query_as::<Board>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// List all boards ordered by ID.
    pub async fn list(&self) -> Result<Vec<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards ORDER BY id");
        sqlx::query_as::<_, Board>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// List all boards with their post and comment counts, ordered by ID.
    pub async fn list_with_stats(&self) -> Result<Vec<BoardWithStats>> {
        let rows: Vec<BoardStatsRow> = sqlx::query_as(
            "SELECT b.id, b.slug, b.name, b.description, b.write_permission,
                    b.created_at, b.updated_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.board_id = b.id) AS post_count,
                    (SELECT COUNT(*) FROM comments c JOIN posts p ON p.id = c.post_id
                     WHERE p.board_id = b.id) AS comment_count
             FROM boards b ORDER BY b.id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| BoardWithStats {
                board: row.board,
                post_count: row.post_count,
                comment_count: row.comment_count,
            })
            .collect())
    }

    /// Update a board by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated board, or None if not found.
    pub async fn update(&self, id: i64, update: &BoardUpdate) -> Result<Option<Board>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new("UPDATE boards SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(write_permission) = update.write_permission {
            separated.push("write_permission = ");
            separated.push_bind_unseparated(write_permission.as_str());
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

    /// Delete a board by ID. Posts and comments cascade.
    ///
    /// Returns true if a board was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all boards.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM boards")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }
}
