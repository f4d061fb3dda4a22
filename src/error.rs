//! Error types for AIZEVA.

use thiserror::Error;

/// Common error type for AIZEVA.
#[derive(Error, Debug)]
pub enum AizevaError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant. It is reported to
    /// clients as a generic service-unavailable condition.
    #[error("database error: {0}")]
    Database(String),

    /// An external collaborator (identity provider, store) is unreachable
    /// or failed in a way the request cannot recover from.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (missing or invalid credentials).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error, including CSRF failures.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AizevaError {
    fn from(e: sqlx::Error) -> Self {
        AizevaError::Database(e.to_string())
    }
}

impl AizevaError {
    /// True for failures of the server or its collaborators rather than of
    /// the request. Their details are not shown to clients.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AizevaError::Database(_)
                | AizevaError::Dependency(_)
                | AizevaError::Io(_)
                | AizevaError::Config(_)
                | AizevaError::Internal(_)
        )
    }
}

/// Result type alias for AIZEVA operations.
pub type Result<T> = std::result::Result<T, AizevaError>;
