//! Board model for AIZEVA.
//!
//! This module defines the Board struct and the WritePermission tier that
//! gates who may post on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum board name length (in characters).
pub const MAX_BOARD_NAME_LENGTH: usize = 50;

/// Maximum board slug length.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Who may create content on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePermission {
    /// Anyone. Content still needs an authenticated author.
    All,
    /// Any authenticated user.
    #[default]
    Member,
    /// Admins only.
    Admin,
}

impl WritePermission {
    /// Convert to the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePermission::All => "all",
            WritePermission::Member => "member",
            WritePermission::Admin => "admin",
        }
    }
}

impl fmt::Display for WritePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a string that names no write tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown write permission: {0}")]
pub struct UnknownWritePermission(pub String);

impl FromStr for WritePermission {
    type Err = UnknownWritePermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(WritePermission::All),
            "member" => Ok(WritePermission::Member),
            "admin" => Ok(WritePermission::Admin),
            _ => Err(UnknownWritePermission(s.to_string())),
        }
    }
}

impl TryFrom<String> for WritePermission {
    type Error = UnknownWritePermission;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Board entity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID.
    pub id: i64,
    /// URL slug (unique, immutable).
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Description, empty if none.
    pub description: String,
    /// Write tier.
    #[sqlx(try_from = "String")]
    pub write_permission: WritePermission,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Board together with its content counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardWithStats {
    /// The board.
    pub board: Board,
    /// Number of posts on the board.
    pub post_count: i64,
    /// Number of comments on the board's posts.
    pub comment_count: i64,
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    /// URL slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Write tier (defaults to Member).
    pub write_permission: WritePermission,
}

impl NewBoard {
    /// Create a new board with minimal required fields.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: String::new(),
            write_permission: WritePermission::Member,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the write tier.
    pub fn with_write_permission(mut self, write_permission: WritePermission) -> Self {
        self.write_permission = write_permission;
        self
    }
}

/// Data for updating an existing board. The slug cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct BoardUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New write tier.
    pub write_permission: Option<WritePermission>,
}

impl BoardUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set new write tier.
    pub fn write_permission(mut self, write_permission: WritePermission) -> Self {
        self.write_permission = Some(write_permission);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.write_permission.is_none()
    }
}

/// Validate a board name.
pub fn validate_board_name(name: &str) -> crate::Result<()> {
    let length = name.trim().chars().count();
    if length == 0 {
        return Err(crate::AizevaError::Validation(
            "board name is required".to_string(),
        ));
    }
    if length > MAX_BOARD_NAME_LENGTH {
        return Err(crate::AizevaError::Validation(format!(
            "board name must be at most {MAX_BOARD_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a board slug: lowercase letters, digits and hyphens.
pub fn validate_slug(slug: &str) -> crate::Result<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
        return Err(crate::AizevaError::Validation(format!(
            "slug must be 1 to {MAX_SLUG_LENGTH} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(crate::AizevaError::Validation(
            "slug can only contain lowercase letters, digits and hyphens".to_string(),
        ));
    }
    Ok(())
}
