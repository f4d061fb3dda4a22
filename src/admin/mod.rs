//! Administration module for AIZEVA.
//!
//! This module provides administrative functionality including:
//! - User lifecycle (promote, demote, remove with deactivate-vs-delete),
//!   singly or in bulk
//! - User listing, detail and site statistics
//! - Board management (create, update, delete)
//!
//! Every operation requires the global admin flag.

mod board;
mod user;

pub use board::{BoardAdminService, CreateBoardRequest};
pub use user::{
    BulkFailure, BulkOutcome, ContentCounts, RemovalOutcome, SiteStats, UserAdminService,
    UserDetail, DEFAULT_USERS_PER_PAGE, MAX_BULK_USERS, MAX_USERS_PER_PAGE,
};

use thiserror::Error;

use crate::auth::PermissionError;
use crate::AizevaError;

/// Admin-related errors.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Permission denied for the operation.
    #[error("{0}")]
    Permission(#[from] PermissionError),

    /// Target resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid operation or input.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Cannot perform this operation on your own account.
    #[error("cannot perform this operation on your own account")]
    CannotModifySelf,

    /// Cannot demote or remove the last active admin.
    #[error("cannot demote or remove the last active admin")]
    LastAdmin,

    /// The target user has already been deactivated.
    #[error("user is already deactivated")]
    AlreadyDeactivated,

    /// A board with this slug already exists.
    #[error("board slug '{0}' is already in use")]
    DuplicateSlug(String),

    /// General AIZEVA error.
    #[error("{0}")]
    Aizeva(#[from] AizevaError),
}

impl From<AdminError> for AizevaError {
    fn from(e: AdminError) -> Self {
        match e {
            AdminError::Permission(p) => p.into(),
            AdminError::NotFound(what) => AizevaError::NotFound(what),
            AdminError::InvalidOperation(msg) => AizevaError::Validation(msg),
            AdminError::CannotModifySelf
            | AdminError::LastAdmin
            | AdminError::AlreadyDeactivated
            | AdminError::DuplicateSlug(_) => AizevaError::Conflict(e.to_string()),
            AdminError::Aizeva(inner) => inner,
        }
    }
}
