//! User management for administrators.
//!
//! This module provides administrative functions for managing users:
//! - List and inspect users with their content counts
//! - Promote and demote admins (the last active admin is protected)
//! - Remove users, hard-deleting those without content and deactivating
//!   the rest, with a content check to preview which it will be
//! - Bulk promote, demote and remove, each id going through the single-user
//!   policy
//! - Site statistics

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::auth::{require_admin, IdentityProvider, SessionStore};
use crate::board::{
    page_offset, BoardRepository, CommentRepository, PaginatedResult, PostRepository,
};
use crate::db::{
    Database, DbConnection, User, UserListQuery, UserRepository, DELETED_USER_PLACEHOLDER,
    SQL_NOW,
};
use crate::AizevaError;

use super::AdminError;

/// Default page size for user listings.
pub const DEFAULT_USERS_PER_PAGE: i64 = 20;

/// Largest page size accepted for user listings.
pub const MAX_USERS_PER_PAGE: i64 = 100;

/// Most user ids accepted by one bulk operation.
pub const MAX_BULK_USERS: usize = 100;

/// Appended to profile writes during removal so the last active admin can
/// never disappear, even when two removals race. Used inside a transaction
/// holding [`UserRepository::lock_active_admins`].
const LAST_ADMIN_GUARD: &str = "AND (is_admin = FALSE
     OR (SELECT COUNT(*) FROM users WHERE is_admin = TRUE AND deleted_at IS NULL) > 1)";

/// A user together with how much they have written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetail {
    /// User profile.
    pub user: User,
    /// Number of posts authored.
    pub post_count: i64,
    /// Number of comments authored.
    pub comment_count: i64,
}

/// What happened to a removed user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The user had no content; profile and identity are gone.
    Deleted { user_id: String },
    /// The user had content; the profile was anonymized and kept.
    Deactivated {
        user_id: String,
        placeholder_username: String,
    },
}

impl RemovalOutcome {
    /// Id of the removed user.
    pub fn user_id(&self) -> &str {
        match self {
            RemovalOutcome::Deleted { user_id } => user_id,
            RemovalOutcome::Deactivated { user_id, .. } => user_id,
        }
    }
}

/// Site-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteStats {
    /// Active (not deactivated) users.
    pub active_users: i64,
    /// Active admins.
    pub admins: i64,
    /// Posts on all boards.
    pub posts: i64,
    /// Comments on all posts.
    pub comments: i64,
    /// Boards.
    pub boards: i64,
}

/// What a user has written. Decides between deletion and deactivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentCounts {
    /// Posts authored.
    pub posts: i64,
    /// Top-level comments authored.
    pub top_level_comments: i64,
    /// Replies authored.
    pub replies: i64,
    /// Distinct posts the user commented on.
    pub participated_posts: i64,
}

impl ContentCounts {
    /// Posts and comments together.
    pub fn total(&self) -> i64 {
        self.posts + self.top_level_comments + self.replies
    }

    /// Removing a user with content deactivates instead of deleting.
    pub fn has_content(&self) -> bool {
        self.total() > 0
    }

    async fn load(conn: &mut DbConnection, user_id: &str) -> Result<Self, AdminError> {
        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(db_err)?;
        let top_level_comments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE author_id = $1 AND parent_id IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;
        let replies: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE author_id = $1 AND parent_id IS NOT NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;
        let participated_posts: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT post_id) FROM comments WHERE author_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?;

        Ok(Self {
            posts,
            top_level_comments,
            replies,
            participated_posts,
        })
    }
}

/// One id a bulk operation could not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    /// Target user id.
    pub user_id: String,
    /// Why the single-user operation refused it.
    pub reason: String,
}

/// Per-id results of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Ids the operation was applied to, in request order.
    pub succeeded: Vec<String>,
    /// Ids it was refused for, in request order.
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    fn record<T>(&mut self, user_id: &str, result: Result<T, AdminError>) {
        match result {
            Ok(_) => self.succeeded.push(user_id.to_string()),
            Err(e) => {
                let reason = match e {
                    AdminError::Aizeva(ref inner) if inner.is_infrastructure() => {
                        error!(user_id, error = %inner, "Bulk operation failed for user");
                        "service temporarily unavailable".to_string()
                    }
                    other => other.to_string(),
                };
                self.failed.push(BulkFailure {
                    user_id: user_id.to_string(),
                    reason,
                });
            }
        }
    }
}

/// Distinct ids in request order, rejecting empty and oversized batches.
fn bulk_targets(user_ids: &[String]) -> Result<Vec<&str>, AdminError> {
    let mut seen = HashSet::new();
    let targets: Vec<&str> = user_ids
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect();

    if targets.is_empty() {
        return Err(AdminError::InvalidOperation(
            "no users selected".to_string(),
        ));
    }
    if targets.len() > MAX_BULK_USERS {
        return Err(AdminError::InvalidOperation(format!(
            "at most {MAX_BULK_USERS} users per request"
        )));
    }
    Ok(targets)
}

fn db_err(e: sqlx::Error) -> AdminError {
    AdminError::Aizeva(AizevaError::Database(e.to_string()))
}

/// Admin service for user management.
pub struct UserAdminService<'a> {
    db: &'a Database,
    identity: &'a dyn IdentityProvider,
    sessions: &'a SessionStore,
    allow_self_demotion: bool,
}

impl<'a> UserAdminService<'a> {
    /// Create a new UserAdminService.
    pub fn new(
        db: &'a Database,
        identity: &'a dyn IdentityProvider,
        sessions: &'a SessionStore,
    ) -> Self {
        Self {
            db,
            identity,
            sessions,
            allow_self_demotion: false,
        }
    }

    /// Allow admins to demote themselves while other admins exist.
    pub fn with_self_demotion(mut self, allow: bool) -> Self {
        self.allow_self_demotion = allow;
        self
    }

    async fn get_target(&self, user_id: &str) -> Result<User, AdminError> {
        UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AdminError::NotFound("user".to_string()))
    }

    async fn detail(&self, user: User) -> Result<UserDetail, AdminError> {
        let (post_count, comment_count) = UserRepository::new(self.db.pool())
            .content_counts(&user.id)
            .await?;
        Ok(UserDetail {
            user,
            post_count,
            comment_count,
        })
    }

    /// List users matching `query`, newest first.
    ///
    /// `per_page` is clamped to `1..=MAX_USERS_PER_PAGE`.
    pub async fn list_users(
        &self,
        admin: &User,
        query: &UserListQuery,
        page: i64,
        per_page: i64,
    ) -> Result<PaginatedResult<UserDetail>, AdminError> {
        require_admin(Some(admin))?;

        let per_page = per_page.clamp(1, MAX_USERS_PER_PAGE);
        let offset = page_offset(page, per_page)?;

        let repo = UserRepository::new(self.db.pool());
        let total = repo.count(query).await?;
        let users = match offset {
            Some(offset) => repo.list(query, offset, per_page).await?,
            None => Vec::new(),
        };

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.detail(user).await?);
        }

        Ok(PaginatedResult {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Get a user's detail, including deactivated users.
    pub async fn get_user(&self, admin: &User, user_id: &str) -> Result<UserDetail, AdminError> {
        require_admin(Some(admin))?;
        let user = self.get_target(user_id).await?;
        self.detail(user).await
    }

    /// Grant the admin flag. Promoting an admin is a no-op.
    pub async fn promote(&self, admin: &User, user_id: &str) -> Result<User, AdminError> {
        require_admin(Some(admin))?;

        let target = self.get_target(user_id).await?;
        if !target.is_active() {
            return Err(AdminError::AlreadyDeactivated);
        }
        if target.is_admin {
            return Ok(target);
        }

        UserRepository::new(self.db.pool()).promote(user_id).await?;
        info!(admin_id = %admin.id, user_id, "User promoted to admin");

        self.get_target(user_id).await
    }

    /// Clear the admin flag. Demoting a non-admin is a no-op.
    ///
    /// The last active admin can never be demoted, and self-demotion is
    /// refused unless enabled.
    pub async fn demote(&self, admin: &User, user_id: &str) -> Result<User, AdminError> {
        require_admin(Some(admin))?;

        let target = self.get_target(user_id).await?;
        if !target.is_active() {
            return Err(AdminError::AlreadyDeactivated);
        }
        if !target.is_admin {
            return Ok(target);
        }
        if target.id == admin.id && !self.allow_self_demotion {
            return Err(AdminError::CannotModifySelf);
        }

        let demoted = UserRepository::new(self.db.pool())
            .demote_unless_last_admin(user_id)
            .await?;
        if !demoted {
            return Err(AdminError::LastAdmin);
        }
        info!(admin_id = %admin.id, user_id, "Admin demoted");

        self.get_target(user_id).await
    }

    /// Remove a user.
    ///
    /// A user without posts or comments is deleted outright, identity
    /// included. Anyone else is deactivated: the identity is disabled and
    /// the profile anonymized while their content keeps pointing at it.
    /// All of the user's sessions are destroyed either way.
    pub async fn remove(&self, admin: &User, user_id: &str) -> Result<RemovalOutcome, AdminError> {
        require_admin(Some(admin))?;

        if admin.id == user_id {
            return Err(AdminError::CannotModifySelf);
        }
        let target = self.get_target(user_id).await?;
        if !target.is_active() {
            return Err(AdminError::AlreadyDeactivated);
        }
        if target.is_admin
            && UserRepository::new(self.db.pool())
                .count_active_admins()
                .await?
                <= 1
        {
            return Err(AdminError::LastAdmin);
        }

        // Disable first so the user cannot log in while the profile changes.
        let had_identity = self.set_identity_disabled(user_id, true).await?;

        let outcome = match self.remove_profile(user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if had_identity {
                    if let Err(restore) = self.identity.set_disabled(user_id, false).await {
                        error!(
                            user_id,
                            error = %restore,
                            "Removal failed and identity could not be re-enabled; reconcile manually"
                        );
                    }
                }
                return Err(e);
            }
        };

        if had_identity && matches!(outcome, RemovalOutcome::Deleted { .. }) {
            if let Err(e) = self.identity.delete_identity(user_id).await {
                error!(
                    user_id,
                    error = %e,
                    "Profile deleted but identity remains (disabled); reconcile manually"
                );
            }
        }

        let sessions = self.sessions.destroy_for_user(user_id);
        info!(
            admin_id = %admin.id,
            user_id,
            outcome = ?outcome,
            sessions,
            "User removed"
        );

        Ok(outcome)
    }

    /// Returns whether the identity existed.
    async fn set_identity_disabled(&self, user_id: &str, disabled: bool) -> Result<bool, AdminError> {
        match self.identity.set_disabled(user_id, disabled).await {
            Ok(()) => Ok(true),
            Err(AizevaError::NotFound(_)) => {
                warn!(user_id, "Profile has no identity");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_profile(&self, user_id: &str) -> Result<RemovalOutcome, AdminError> {
        let mut tx = self.db.pool().begin().await.map_err(db_err)?;
        UserRepository::lock_active_admins(&mut tx).await?;

        let counts = ContentCounts::load(&mut *tx, user_id).await?;

        let outcome = if !counts.has_content() {
            let result = sqlx::query(&format!(
                "DELETE FROM users WHERE id = $1 AND deleted_at IS NULL {LAST_ADMIN_GUARD}"
            ))
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            if result.rows_affected() == 0 {
                return Err(AdminError::LastAdmin);
            }
            RemovalOutcome::Deleted {
                user_id: user_id.to_string(),
            }
        } else {
            let result = sqlx::query(&format!(
                "UPDATE users
                 SET username = $1, display_name = NULL, is_admin = FALSE, deleted_at = {SQL_NOW}
                 WHERE id = $2 AND deleted_at IS NULL {LAST_ADMIN_GUARD}"
            ))
            .bind(DELETED_USER_PLACEHOLDER)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            if result.rows_affected() == 0 {
                return Err(AdminError::LastAdmin);
            }
            RemovalOutcome::Deactivated {
                user_id: user_id.to_string(),
                placeholder_username: DELETED_USER_PLACEHOLDER.to_string(),
            }
        };

        tx.commit().await.map_err(db_err)?;

        info!(
            user_id,
            posts = counts.posts,
            top_level_comments = counts.top_level_comments,
            replies = counts.replies,
            "User profile removed"
        );

        Ok(outcome)
    }

    /// What `user_id` has written, so a removal can be previewed.
    pub async fn content_check(
        &self,
        admin: &User,
        user_id: &str,
    ) -> Result<ContentCounts, AdminError> {
        require_admin(Some(admin))?;
        self.get_target(user_id).await?;

        let mut conn = self.db.pool().acquire().await.map_err(db_err)?;
        ContentCounts::load(&mut *conn, user_id).await
    }

    /// Promote every listed user that [`promote`](Self::promote) accepts.
    pub async fn bulk_promote(
        &self,
        admin: &User,
        user_ids: &[String],
    ) -> Result<BulkOutcome, AdminError> {
        require_admin(Some(admin))?;
        let mut outcome = BulkOutcome::default();
        for user_id in bulk_targets(user_ids)? {
            outcome.record(user_id, self.promote(admin, user_id).await);
        }
        info!(
            admin_id = %admin.id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk promote"
        );
        Ok(outcome)
    }

    /// Demote every listed user that [`demote`](Self::demote) accepts.
    ///
    /// Ids are processed in order with the acting admin's own id moved last.
    /// Once only one admin is left the remaining admin ids fail with the
    /// last-admin guard.
    pub async fn bulk_demote(
        &self,
        admin: &User,
        user_ids: &[String],
    ) -> Result<BulkOutcome, AdminError> {
        require_admin(Some(admin))?;
        let mut targets = bulk_targets(user_ids)?;
        targets.sort_by_key(|id| *id == admin.id);

        let mut outcome = BulkOutcome::default();
        for user_id in targets {
            outcome.record(user_id, self.demote(admin, user_id).await);
        }
        info!(
            admin_id = %admin.id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk demote"
        );
        Ok(outcome)
    }

    /// Remove every listed user that [`remove`](Self::remove) accepts.
    pub async fn bulk_remove(
        &self,
        admin: &User,
        user_ids: &[String],
    ) -> Result<BulkOutcome, AdminError> {
        require_admin(Some(admin))?;
        let mut outcome = BulkOutcome::default();
        for user_id in bulk_targets(user_ids)? {
            outcome.record(user_id, self.remove(admin, user_id).await);
        }
        info!(
            admin_id = %admin.id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk remove"
        );
        Ok(outcome)
    }

    /// Site-wide statistics.
    pub async fn stats(&self, admin: &User) -> Result<SiteStats, AdminError> {
        require_admin(Some(admin))?;

        let pool = self.db.pool();
        let users = UserRepository::new(pool);
        Ok(SiteStats {
            active_users: users.count(&UserListQuery::default()).await?,
            admins: users.count_active_admins().await?,
            posts: PostRepository::new(pool).count().await?,
            comments: CommentRepository::new(pool).count().await?,
            boards: BoardRepository::new(pool).count().await?,
        })
    }
}
