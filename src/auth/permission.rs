//! Access control for AIZEVA.
//!
//! Two predicates decide every mutation: [`can_write`] for creating content
//! on a board and [`can_moderate`] for editing or deleting existing content.
//! The `require_*` helpers turn them into errors for the service layer.

use thiserror::Error;

use crate::board::{Board, WritePermission};
use crate::db::User;
use crate::AizevaError;

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The caller is not logged in.
    #[error("login required")]
    NotAuthenticated,

    /// The caller's account has been deactivated.
    #[error("account disabled")]
    AccountInactive,

    /// Admin privileges are required.
    #[error("admin privileges required")]
    AdminRequired,

    /// The board's write tier excludes the caller.
    #[error("you do not have permission to write on this board")]
    BoardWriteDenied,

    /// Only the author or an admin may change this content.
    #[error("only the author or an admin can modify this content")]
    NotAuthorOrAdmin,
}

impl From<PermissionError> for AizevaError {
    fn from(e: PermissionError) -> Self {
        match e {
            PermissionError::NotAuthenticated => AizevaError::Auth(e.to_string()),
            other => AizevaError::Permission(other.to_string()),
        }
    }
}

/// Content with an author, used by [`can_moderate`].
pub trait Authored {
    /// Id of the user who wrote this.
    fn author_id(&self) -> &str;
}

fn active(user: Option<&User>) -> Option<&User> {
    user.filter(|u| u.is_active())
}

/// Whether `user` (None = anonymous) may create content on `board`.
pub fn can_write(user: Option<&User>, board: &Board) -> bool {
    match board.write_permission {
        WritePermission::All => true,
        WritePermission::Member => active(user).is_some(),
        WritePermission::Admin => active(user).is_some_and(|u| u.is_admin),
    }
}

/// Whether `user` may edit or delete `content`.
pub fn can_moderate(user: &User, content: &impl Authored) -> bool {
    user.is_active() && (user.is_admin || user.id == content.author_id())
}

/// Fail unless `user` may write on `board`.
pub fn require_write(user: Option<&User>, board: &Board) -> Result<(), PermissionError> {
    if can_write(user, board) {
        return Ok(());
    }
    match user {
        None if board.write_permission == WritePermission::Member => {
            Err(PermissionError::NotAuthenticated)
        }
        Some(u) if !u.is_active() => Err(PermissionError::AccountInactive),
        _ => Err(PermissionError::BoardWriteDenied),
    }
}

/// Fail unless `user` is the author of `content` or an admin.
pub fn require_moderate(user: &User, content: &impl Authored) -> Result<(), PermissionError> {
    if !user.is_active() {
        return Err(PermissionError::AccountInactive);
    }
    if can_moderate(user, content) {
        Ok(())
    } else {
        Err(PermissionError::NotAuthorOrAdmin)
    }
}

/// Fail unless `user` is an active admin.
pub fn require_admin(user: Option<&User>) -> Result<(), PermissionError> {
    let user = user.ok_or(PermissionError::NotAuthenticated)?;
    if !user.is_active() {
        return Err(PermissionError::AccountInactive);
    }
    if !user.is_admin {
        return Err(PermissionError::AdminRequired);
    }
    Ok(())
}
