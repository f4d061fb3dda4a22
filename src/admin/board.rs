//! Board management for administrators.
//!
//! This module provides administrative functions for managing boards:
//! - Create board
//! - Update board (name, description, write tier; the slug is fixed)
//! - Delete board, cascading its posts and comments

use tracing::info;

use crate::auth::require_admin;
use crate::board::{
    validate_board_name, validate_slug, Board, BoardRepository, BoardUpdate, NewBoard,
    WritePermission,
};
use crate::db::{Database, User};

use super::AdminError;

/// Request to create a new board.
#[derive(Debug, Clone)]
pub struct CreateBoardRequest {
    /// URL slug, `[a-z0-9-]`.
    pub slug: String,
    /// Board name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Write tier, `member` when absent.
    pub write_permission: Option<WritePermission>,
}

impl CreateBoardRequest {
    /// Create a request with the default tier and no description.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            write_permission: None,
        }
    }

    fn into_new_board(self) -> NewBoard {
        let mut board = NewBoard::new(self.slug.trim(), self.name.trim());
        if let Some(description) = self.description {
            board = board.with_description(description.trim());
        }
        if let Some(permission) = self.write_permission {
            board = board.with_write_permission(permission);
        }
        board
    }
}

/// Admin service for board management.
pub struct BoardAdminService<'a> {
    db: &'a Database,
}

impl<'a> BoardAdminService<'a> {
    /// Create a new BoardAdminService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new board.
    pub async fn create_board(
        &self,
        request: CreateBoardRequest,
        admin: &User,
    ) -> Result<Board, AdminError> {
        require_admin(Some(admin))?;

        validate_slug(request.slug.trim())?;
        validate_board_name(request.name.trim())?;

        let repo = BoardRepository::new(self.db.pool());
        let slug = request.slug.trim().to_string();
        if repo.slug_exists(&slug).await? {
            return Err(AdminError::DuplicateSlug(slug));
        }

        let board = repo.create(&request.into_new_board()).await?;
        info!(admin_id = %admin.id, board_id = board.id, slug = %board.slug, "Board created");
        Ok(board)
    }

    /// Update an existing board.
    pub async fn update_board(
        &self,
        board_id: i64,
        update: &BoardUpdate,
        admin: &User,
    ) -> Result<Board, AdminError> {
        require_admin(Some(admin))?;

        if update.is_empty() {
            return Err(AdminError::InvalidOperation("nothing to update".to_string()));
        }
        let mut update = update.clone();
        if let Some(name) = update.name.take() {
            let name = name.trim().to_string();
            validate_board_name(&name)?;
            update.name = Some(name);
        }

        let updated = BoardRepository::new(self.db.pool())
            .update(board_id, &update)
            .await?
            .ok_or_else(|| AdminError::NotFound("board".to_string()))?;

        info!(admin_id = %admin.id, board_id, "Board updated");
        Ok(updated)
    }

    /// Delete a board with all its posts and comments.
    pub async fn delete_board(&self, board_id: i64, admin: &User) -> Result<(), AdminError> {
        require_admin(Some(admin))?;

        let deleted = BoardRepository::new(self.db.pool()).delete(board_id).await?;
        if !deleted {
            return Err(AdminError::NotFound("board".to_string()));
        }

        info!(admin_id = %admin.id, board_id, "Board deleted");
        Ok(())
    }
}
