//! User repository for AIZEVA.
//!
//! This module provides CRUD operations for user profiles in the database.

use sqlx::QueryBuilder;

use super::user::{NewUser, User, UserUpdate};
use super::{like_pattern, DbBackend, DbPool, DbTransaction, LIKE_ESCAPE};
use crate::{AizevaError, Result};

const USER_COLUMNS: &str =
    "id, email, username, display_name, is_admin, created_at, deleted_at";

/// Role filter for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    /// Every user.
    #[default]
    All,
    /// Only admins.
    Admin,
    /// Only non-admins.
    Member,
}

impl RoleFilter {
    /// Parse a query-string value, treating unknown values as `All`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => RoleFilter::Admin,
            "member" => RoleFilter::Member,
            _ => RoleFilter::All,
        }
    }
}

/// Filters for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    /// Case-insensitive substring matched against username and email.
    pub search: Option<String>,
    /// Role filter.
    pub role: RoleFilter,
    /// Include deactivated users.
    pub include_deleted: bool,
}

impl UserListQuery {
    fn push_filters<'q>(&'q self, query: &mut QueryBuilder<'q, DbBackend>) {
        query.push(" WHERE 1 = 1");
        if !self.include_deleted {
            query.push(" AND deleted_at IS NULL");
        }
        match self.role {
            RoleFilter::All => {}
            RoleFilter::Admin => {
                query.push(" AND is_admin = TRUE");
            }
            RoleFilter::Member => {
                query.push(" AND is_admin = FALSE");
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            query.push(" AND (LOWER(username) LIKE ");
            query.push_bind(pattern.clone());
            query.push(LIKE_ESCAPE);
            query.push(" OR LOWER(email) LIKE ");
            query.push_bind(pattern);
            query.push(LIKE_ESCAPE);
            query.push(")");
        }
    }
}

/// Repository for user profile CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new profile row.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, email, username, display_name, is_admin)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.display_name)
        .bind(new_user.is_admin)
        .execute(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        self.get_by_id(&new_user.id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("user".to_string()))
    }

    /// Get a user by ID, including deactivated users.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an active user by ID.
    pub async fn get_active_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.get_by_id(id).await?.filter(User::is_active))
    }

    /// Get an active user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL"
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Check whether an active user already uses this username.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Check whether any profile already uses this email.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_one(self.pool)
                .await
                .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Update a user's profile fields.
    ///
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref username) = update.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(ref display_name) = update.display_name {
            separated.push("display_name = ");
            separated.push_bind_unseparated(display_name.clone());
        }

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

    /// Grant the admin flag to an active user.
    ///
    /// Returns true if a row changed.
    pub async fn promote(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_admin = TRUE
             WHERE id = $1 AND is_admin = FALSE AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Clear the admin flag unless the user is the last active admin.
    ///
    /// The admin rows are locked and the admin count is checked in the same
    /// statement as the write, so two concurrent demotions can never leave
    /// the system without an admin. Returns true if a row changed.
    pub async fn demote_unless_last_admin(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;
        Self::lock_active_admins(&mut tx).await?;

        let result = sqlx::query(
            "UPDATE users SET is_admin = FALSE
             WHERE id = $1 AND is_admin = TRUE AND deleted_at IS NULL
               AND (SELECT COUNT(*) FROM users WHERE is_admin = TRUE AND deleted_at IS NULL) > 1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock every active admin row until `tx` ends.
    ///
    /// Writers that may drop an admin take this first, so under READ
    /// COMMITTED they queue up and each sees the admin count left by the
    /// previous one. SQLite serializes writers already and needs no lock.
    pub async fn lock_active_admins(tx: &mut DbTransaction<'_>) -> Result<()> {
        #[cfg(feature = "postgres")]
        sqlx::query("SELECT id FROM users WHERE is_admin = TRUE AND deleted_at IS NULL FOR UPDATE")
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;
        #[cfg(feature = "sqlite")]
        let _ = tx;
        Ok(())
    }

    /// Count active admins.
    pub async fn count_active_admins(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE is_admin = TRUE AND deleted_at IS NULL",
        )
        .fetch_one(self.pool)
        .await
        .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Delete a profile row.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List users matching the query, newest first.
    pub async fn list(&self, filter: &UserListQuery, offset: i64, limit: i64) -> Result<Vec<User>> {
        let mut query: QueryBuilder<DbBackend> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        filter.push_filters(&mut query);
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        query
            .build_query_as::<User>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count users matching the query.
    pub async fn count(&self, filter: &UserListQuery) -> Result<i64> {
        let mut query: QueryBuilder<DbBackend> = QueryBuilder::new("SELECT COUNT(*) FROM users");
        filter.push_filters(&mut query);

        query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))
    }

    /// Count posts and comments authored by a user.
    pub async fn content_counts(&self, id: &str) -> Result<(i64, i64)> {
        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AizevaError::Database(e.to_string()))?;
        let comments: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE author_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| AizevaError::Database(e.to_string()))?;

        Ok((posts, comments))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    async fn create(db: &Database, id: &str, username: &str, admin: bool) -> User {
        let repo = UserRepository::new(db.pool());
        repo.create(
            &NewUser::new(id, format!("{username}@example.com"), username).with_admin(admin),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup_db().await;
        let user = create(&db, "u1", "alice", false).await;

        assert_eq!(user.id, "u1");
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin);
        assert!(user.is_active());

        let repo = UserRepository::new(db.pool());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.get_by_username("ALICE").await.unwrap().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_duplicate_active_username_rejected() {
        let db = setup_db().await;
        create(&db, "u1", "alice", false).await;

        let repo = UserRepository::new(db.pool());
        let result = repo
            .create(&NewUser::new("u2", "other@example.com", "alice"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_username_exists_and_email_exists() {
        let db = setup_db().await;
        create(&db, "u1", "alice", false).await;

        let repo = UserRepository::new(db.pool());
        assert!(repo.username_exists("alice").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());
        assert!(repo.email_exists("ALICE@example.com").await.unwrap());
        assert!(!repo.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = setup_db().await;
        create(&db, "u1", "alice", false).await;

        let repo = UserRepository::new(db.pool());
        let updated = repo
            .update(
                "u1",
                &UserUpdate::new()
                    .username("alice2")
                    .display_name(Some("Alice".to_string())),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.display_name.as_deref(), Some("Alice"));

        assert!(repo
            .update("missing", &UserUpdate::new().username("x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_promote_and_demote_guard() {
        let db = setup_db().await;
        create(&db, "a1", "admin1", true).await;
        create(&db, "m1", "member1", false).await;

        let repo = UserRepository::new(db.pool());
        assert!(!repo.demote_unless_last_admin("a1").await.unwrap());
        assert_eq!(repo.count_active_admins().await.unwrap(), 1);

        assert!(repo.promote("m1").await.unwrap());
        assert!(!repo.promote("m1").await.unwrap());
        assert_eq!(repo.count_active_admins().await.unwrap(), 2);

        assert!(repo.demote_unless_last_admin("a1").await.unwrap());
        assert!(!repo.demote_unless_last_admin("m1").await.unwrap());
        assert_eq!(repo.count_active_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_and_count_with_filters() {
        let db = setup_db().await;
        create(&db, "a1", "admin1", true).await;
        create(&db, "m1", "member1", false).await;
        create(&db, "m2", "member2", false).await;
        sqlx::query("UPDATE users SET deleted_at = datetime('now') WHERE id = 'm2'")
            .execute(db.pool())
            .await
            .unwrap();

        let repo = UserRepository::new(db.pool());

        let all = UserListQuery::default();
        assert_eq!(repo.count(&all).await.unwrap(), 2);

        let with_deleted = UserListQuery {
            include_deleted: true,
            ..Default::default()
        };
        assert_eq!(repo.count(&with_deleted).await.unwrap(), 3);

        let admins = UserListQuery {
            role: RoleFilter::Admin,
            ..Default::default()
        };
        let listed = repo.list(&admins, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "a1");

        let search = UserListQuery {
            search: Some("MEMBER".to_string()),
            include_deleted: true,
            ..Default::default()
        };
        assert_eq!(repo.count(&search).await.unwrap(), 2);
        assert_eq!(repo.list(&search, 1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup_db().await;
        create(&db, "u1", "alice", false).await;

        let repo = UserRepository::new(db.pool());
        assert!(repo.delete("u1").await.unwrap());
        assert!(!repo.delete("u1").await.unwrap());
        assert!(repo.get_by_id("u1").await.unwrap().is_none());
    }

    #[test]
    fn test_role_filter_parse() {
        assert_eq!(RoleFilter::parse("admin"), RoleFilter::Admin);
        assert_eq!(RoleFilter::parse("Member"), RoleFilter::Member);
        assert_eq!(RoleFilter::parse("whatever"), RoleFilter::All);
    }
}
