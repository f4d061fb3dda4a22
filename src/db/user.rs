//! User profile model for AIZEVA.
//!
//! A profile row is keyed by the identity-provider id and holds everything
//! the community needs to know about a member. Credentials live with the
//! identity provider, never here.

/// Username given to deactivated users.
pub const DELETED_USER_PLACEHOLDER: &str = "[deleted user]";

/// User entity representing a community member.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Identity-provider id (UUID string).
    pub id: String,
    /// Email address, copied from the identity at signup.
    pub email: String,
    /// Public username.
    pub username: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Global admin flag.
    pub is_admin: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Set when the user has been deactivated.
    pub deleted_at: Option<String>,
}

impl User {
    /// Whether the user is still active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Name to show next to authored content.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// New user profile for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Identity-provider id this profile belongs to.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Admin flag.
    pub is_admin: bool,
}

impl NewUser {
    /// Create a new non-admin profile.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            display_name: None,
            is_admin: false,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set the admin flag.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// Partial profile update. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New username.
    pub username: Option<String>,
    /// New display name (`Some(None)` clears it).
    pub display_name: Option<Option<String>>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set or clear the display name.
    pub fn display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = Some(display_name);
        self
    }

    /// Check if the update has no changes.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.display_name.is_none()
    }
}
