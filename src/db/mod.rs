//! Database module for AIZEVA.
//!
//! Wraps an sqlx connection pool (SQLite or PostgreSQL, selected by cargo
//! feature) and applies schema migrations on open.

mod repository;
mod schema;
mod user;

pub use repository::{RoleFilter, UserListQuery, UserRepository};
pub use schema::MIGRATIONS;
pub use user::{NewUser, User, UserUpdate, DELETED_USER_PLACEHOLDER};

use tracing::{debug, info};

use crate::{AizevaError, Result};

#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!("features `sqlite` and `postgres` are mutually exclusive");

/// SQL backend selected at compile time.
#[cfg(feature = "sqlite")]
pub type DbBackend = sqlx::Sqlite;
/// SQL backend selected at compile time.
#[cfg(feature = "postgres")]
pub type DbBackend = sqlx::Postgres;

/// Connection pool for the selected backend.
pub type DbPool = sqlx::Pool<DbBackend>;

/// Transaction on the selected backend.
pub type DbTransaction<'c> = sqlx::Transaction<'c, DbBackend>;

/// Single connection on the selected backend.
pub type DbConnection = <DbBackend as sqlx::Database>::Connection;

/// Current timestamp expression, formatted like the TEXT timestamp columns.
#[cfg(feature = "sqlite")]
pub const SQL_NOW: &str = "datetime('now')";
/// Current timestamp expression, formatted like the TEXT timestamp columns.
#[cfg(feature = "postgres")]
pub const SQL_NOW: &str = "TO_CHAR(NOW(), 'YYYY-MM-DD HH24:MI:SS')";

#[cfg(feature = "sqlite")]
const SCHEMA_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
)";

#[cfg(feature = "postgres")]
const SCHEMA_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version     BIGINT PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT TO_CHAR(NOW(), 'YYYY-MM-DD HH24:MI:SS')
)";

/// Suffix for `LIKE` clauses whose pattern came from [`like_pattern`].
pub const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// Lowercased substring pattern for `LOWER(col) LIKE`, with `\`, `%` and `_`
/// in the term matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Database wrapper owning the connection pool.
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open a database at the given URL and apply pending migrations.
    ///
    /// For SQLite the file (and its parent directory) is created if missing.
    #[cfg(feature = "sqlite")]
    pub async fn open(url: &str, max_connections: u32) -> Result<Self> {
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
        use std::str::FromStr;
        use std::time::Duration;

        info!("Opening database at {}", url);

        if let Some(path) = url.strip_prefix("sqlite://") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AizevaError::Config(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| AizevaError::Dependency(format!("database connection failed: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a database at the given URL and apply pending migrations.
    #[cfg(feature = "postgres")]
    pub async fn open(url: &str, max_connections: u32) -> Result<Self> {
        use sqlx::postgres::PgPoolOptions;

        info!("Opening database");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(|e| AizevaError::Dependency(format!("database connection failed: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open an in-memory database for testing.
    ///
    /// The pool holds exactly one connection that never expires, since every
    /// SQLite in-memory connection is its own database.
    #[cfg(feature = "sqlite")]
    pub async fn open_in_memory() -> Result<Self> {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        debug!("Opening in-memory database");

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get the current schema version (0 for a fresh database).
    pub async fn schema_version(&self) -> Result<i64> {
        sqlx::query(SCHEMA_VERSION_TABLE).execute(&self.pool).await?;

        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
                .fetch_one(&self.pool)
                .await?;

        Ok(version)
    }

    /// Apply pending migrations, each in its own transaction.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self.schema_version().await?;

        if current_version as usize >= MIGRATIONS.len() {
            debug!("Database is up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating database from version {} to {}",
            current_version,
            MIGRATIONS.len()
        );

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current_version as usize) {
            let version = (i + 1) as i64;
            info!("Applying migration v{}", version);

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(*migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            debug!("Migration v{} applied successfully", version);
        }

        info!(
            "Database migration complete (now at version {})",
            MIGRATIONS.len()
        );
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  Rust "), "%rust%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
        assert_eq!(LIKE_ESCAPE, " ESCAPE '\\'");
    }

    async fn table_exists(db: &Database, name: &str) -> bool {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
        )
        .bind(name)
        .fetch_one(db.pool())
        .await
        .unwrap()
            > 0
    }

    #[tokio::test]
    async fn test_open_in_memory_applies_migrations() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), MIGRATIONS.len() as i64);

        for table in ["identities", "users", "boards", "posts", "comments"] {
            assert!(table_exists(&db, table).await, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO posts (board_id, author_id, title, body) VALUES (999, 'nobody', 't', 'b')",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_write_permission_check_constraint() {
        let db = Database::open_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO boards (slug, name, write_permission) VALUES ('x', 'X', 'everyone')",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aizeva.db");
        let url = format!("sqlite://{}", path.display());

        {
            let db = Database::open(&url, 2).await.unwrap();
            sqlx::query("INSERT INTO boards (slug, name) VALUES ('free', 'Free')")
                .execute(db.pool())
                .await
                .unwrap();
            db.pool().close().await;
        }

        let db = Database::open(&url, 2).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.schema_version().await.unwrap(), MIGRATIONS.len() as i64);
    }
}
