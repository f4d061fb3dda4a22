//! Identity provider abstraction.
//!
//! Credentials are owned by an identity provider, separate from the local
//! profile store. [`LocalIdentityProvider`] keeps them in the `identities`
//! table of the same database; a hosted provider can be plugged in behind
//! the same trait.

use async_trait::async_trait;
use tracing::{debug, info};

use super::password::{hash_password, verify_password, PasswordError};
use crate::db::DbPool;
use crate::{AizevaError, Result};

/// An identity as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Identity {
    /// Stable opaque id (UUID string).
    pub id: String,
    /// Login email.
    pub email: String,
    /// Disabled identities cannot log in.
    pub disabled: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// Contract for credential storage and verification.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new identity. Fails with `Conflict` if the email is taken.
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity>;

    /// Check credentials.
    ///
    /// Unknown email and wrong password both fail with the same `Auth`
    /// error; a disabled identity fails with `Permission`.
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Identity>;

    /// Look up an identity by id.
    async fn get_identity(&self, id: &str) -> Result<Option<Identity>>;

    /// Look up an identity by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Enable or disable an identity.
    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<()>;

    /// Permanently delete an identity.
    async fn delete_identity(&self, id: &str) -> Result<()>;
}

/// Identity provider backed by the `identities` table.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    pool: DbPool,
}

impl LocalIdentityProvider {
    /// Create a provider on the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: String,
    email: String,
    password_hash: String,
    disabled: bool,
    created_at: String,
}

impl IdentityRow {
    fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            disabled: self.disabled,
            created_at: self.created_at,
        }
    }
}

const INVALID_CREDENTIALS: &str = "invalid email or password";

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<Identity> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AizevaError::Conflict("email already registered".to_string()));
        }

        let password_hash = hash_password(password).map_err(|e| match e {
            PasswordError::TooLong => AizevaError::Validation(e.to_string()),
            other => AizevaError::Internal(other.to_string()),
        })?;
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO identities (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(email)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))?;

        info!(identity_id = %id, "Identity created");

        self.get_identity(&id)
            .await?
            .ok_or_else(|| AizevaError::NotFound("identity".to_string()))
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Identity> {
        let row: Option<IdentityRow> = sqlx::query_as(
            "SELECT id, email, password_hash, disabled, created_at
             FROM identities WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))?;

        let row = row.ok_or_else(|| AizevaError::Auth(INVALID_CREDENTIALS.to_string()))?;

        verify_password(password, &row.password_hash).map_err(|e| {
            debug!(identity_id = %row.id, error = %e, "Credential check failed");
            AizevaError::Auth(INVALID_CREDENTIALS.to_string())
        })?;

        if row.disabled {
            return Err(AizevaError::Permission("account disabled".to_string()));
        }

        Ok(row.into_identity())
    }

    async fn get_identity(&self, id: &str) -> Result<Option<Identity>> {
        sqlx::query_as::<_, Identity>(
            "SELECT id, email, disabled, created_at FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        sqlx::query_as::<_, Identity>(
            "SELECT id, email, disabled, created_at FROM identities WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))
    }

    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<()> {
        let result = sqlx::query("UPDATE identities SET disabled = $1 WHERE id = $2")
            .bind(disabled)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AizevaError::NotFound("identity".to_string()));
        }
        debug!(identity_id = %id, disabled, "Identity status changed");
        Ok(())
    }

    async fn delete_identity(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AizevaError::Dependency(format!("identity provider: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AizevaError::NotFound("identity".to_string()));
        }
        info!(identity_id = %id, "Identity deleted");
        Ok(())
    }
}
