//! Signup, login and request authentication.
//!
//! Credentials live with the identity provider; the local `users` table
//! holds the profile keyed by the provider's identity id. Signup writes
//! both and undoes the identity if the profile cannot be written.

use tracing::{error, info, warn};

use super::csrf::CsrfGuard;
use super::identity::IdentityProvider;
use super::password::{validate_password, PasswordError};
use super::session::{Session, SessionStore};
use super::token::TokenIssuer;
use super::validation::{validate_display_name, validate_email, validate_username, ValidationError};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{AizevaError, Result};

/// Signup form.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Login email.
    pub email: String,
    /// Public username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password_confirm: String,
    /// Optional display name.
    pub display_name: Option<String>,
}

impl SignupRequest {
    /// Create a signup request with matching password confirmation.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            email: email.into(),
            username: username.into(),
            password_confirm: password.clone(),
            password,
            display_name: None,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set a (possibly different) password confirmation.
    pub fn with_password_confirm(mut self, password_confirm: impl Into<String>) -> Self {
        self.password_confirm = password_confirm.into();
        self
    }

    /// Check every field, returning the cleaned display name.
    fn validate(&self) -> Result<Option<String>> {
        let invalid = |e: ValidationError| AizevaError::Validation(e.to_string());

        validate_email(self.email.trim()).map_err(invalid)?;
        validate_username(&self.username).map_err(invalid)?;

        let display_name = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if let Some(name) = display_name {
            validate_display_name(name).map_err(invalid)?;
        }

        if self.password != self.password_confirm {
            return Err(invalid(ValidationError::PasswordMismatch));
        }
        validate_password(&self.password)
            .map_err(|e: PasswordError| AizevaError::Validation(e.to_string()))?;

        Ok(display_name.map(str::to_string))
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The logged-in profile.
    pub user: User,
    /// The fresh session that replaced the caller's old one.
    pub session: Session,
    /// Signed access token bound to `session`.
    pub access_token: String,
    /// CSRF token for `session`.
    pub csrf_token: String,
}

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Authentication service.
pub struct AuthService<'a> {
    db: &'a Database,
    identity: &'a dyn IdentityProvider,
    sessions: &'a SessionStore,
    csrf: &'a CsrfGuard,
    tokens: &'a TokenIssuer,
    bootstrap_emails: &'a [String],
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService.
    pub fn new(
        db: &'a Database,
        identity: &'a dyn IdentityProvider,
        sessions: &'a SessionStore,
        csrf: &'a CsrfGuard,
        tokens: &'a TokenIssuer,
    ) -> Self {
        Self {
            db,
            identity,
            sessions,
            csrf,
            tokens,
            bootstrap_emails: &[],
        }
    }

    /// Signups with these emails get an admin profile.
    pub fn with_bootstrap_emails(mut self, emails: &'a [String]) -> Self {
        self.bootstrap_emails = emails;
        self
    }

    /// Register a new user.
    ///
    /// Creates the provider identity, then the local profile. If the
    /// profile step fails the identity is removed again (or, failing that,
    /// disabled), so no identity without a profile can log in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User> {
        let display_name = request.validate()?;
        let email = request.email.trim();

        let users = UserRepository::new(self.db.pool());
        if users.username_exists(&request.username).await? {
            return Err(AizevaError::Conflict("username already taken".to_string()));
        }
        if users.email_exists(email).await? || self.identity.find_by_email(email).await?.is_some()
        {
            return Err(AizevaError::Conflict(
                "email already registered".to_string(),
            ));
        }

        let identity = self
            .identity
            .create_identity(email, &request.password)
            .await?;

        let is_admin = self
            .bootstrap_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email));
        let mut new_user = NewUser::new(&identity.id, email, &request.username).with_admin(is_admin);
        if let Some(name) = display_name {
            new_user = new_user.with_display_name(name);
        }

        match users.create(&new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, is_admin, "User signed up");
                Ok(user)
            }
            Err(e) => {
                warn!(identity_id = %identity.id, error = %e, "Profile creation failed, rolling back identity");
                self.compensate_identity(&identity.id).await;
                Err(e)
            }
        }
    }

    async fn compensate_identity(&self, identity_id: &str) {
        let delete_error = match self.identity.delete_identity(identity_id).await {
            Ok(()) => return,
            Err(e) => e,
        };

        match self.identity.set_disabled(identity_id, true).await {
            Ok(()) => error!(
                identity_id,
                error = %delete_error,
                "Orphan identity could not be deleted and was disabled; reconcile manually"
            ),
            Err(disable_error) => error!(
                identity_id,
                delete_error = %delete_error,
                disable_error = %disable_error,
                "Orphan identity could not be deleted or disabled; reconcile manually"
            ),
        }
    }

    /// Log in with email and password.
    ///
    /// On success `current_session` (if any) is replaced by a new session
    /// bound to the user.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        current_session: Option<&str>,
    ) -> Result<LoginOutcome> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AizevaError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let identity = self
            .identity
            .verify_credentials(email.trim(), password)
            .await?;

        let user = UserRepository::new(self.db.pool())
            .get_by_id(&identity.id)
            .await?
            .ok_or_else(|| {
                warn!(identity_id = %identity.id, "Identity has no profile");
                AizevaError::Auth(INVALID_CREDENTIALS.to_string())
            })?;
        if !user.is_active() {
            return Err(AizevaError::Permission("account disabled".to_string()));
        }

        let session = self.sessions.rotate(current_session, &user.id);
        let access_token = self.tokens.issue(&user, &session.id)?;
        let csrf_token = self.csrf.issue(&session)?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user,
            session,
            access_token,
            csrf_token,
        })
    }

    /// End a session. Returns true if it existed.
    pub fn logout(&self, session_id: &str) -> bool {
        self.sessions.destroy(session_id)
    }

    /// Resolve an access token to the current profile.
    ///
    /// The token's session must still exist and belong to the token's
    /// user, and the profile is re-read so admin changes and removals take
    /// effect immediately.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token)?;

        let session = self
            .sessions
            .get(&claims.sid)
            .filter(|s| s.user_id.as_deref() == Some(claims.sub.as_str()))
            .ok_or_else(|| AizevaError::Auth("session expired".to_string()))?;

        let user = UserRepository::new(self.db.pool())
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AizevaError::Auth("session expired".to_string()))?;

        if !user.is_active() {
            self.sessions.destroy(&session.id);
            return Err(AizevaError::Permission("account disabled".to_string()));
        }
        Ok(user)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::auth::LocalIdentityProvider;
    use std::sync::Arc;
    use std::time::Duration;

    const PASSWORD: &str = "Passw0rd!!";

    struct Fixture {
        db: Database,
        identity: LocalIdentityProvider,
        sessions: Arc<SessionStore>,
        csrf: CsrfGuard,
        tokens: TokenIssuer,
    }

    impl Fixture {
        async fn new() -> Self {
            let db = Database::open_in_memory().await.unwrap();
            let identity = LocalIdentityProvider::new(db.pool().clone());
            let sessions = Arc::new(SessionStore::new(Duration::from_secs(3600)));
            let csrf = CsrfGuard::new(sessions.clone());
            Self {
                db,
                identity,
                sessions,
                csrf,
                tokens: TokenIssuer::new("test-secret", 3600),
            }
        }

        fn service(&self) -> AuthService<'_> {
            AuthService::new(
                &self.db,
                &self.identity,
                &self.sessions,
                &self.csrf,
                &self.tokens,
            )
        }
    }

    // ========================================================================
    // Signup
    // ========================================================================

    #[tokio::test]
    async fn test_signup_and_login() {
        let f = Fixture::new().await;
        let service = f.service();

        let user = service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD).with_display_name("Alice"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert!(!user.is_admin);

        let anonymous = f.sessions.create();
        let outcome = service
            .login("alice@example.com", PASSWORD, Some(&anonymous.id))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, user.id);
        assert_ne!(outcome.session.id, anonymous.id);
        assert!(f.sessions.get(&anonymous.id).is_none());
        assert!(f
            .csrf
            .verify(Some(&outcome.session.id), Some(&outcome.csrf_token))
            .is_ok());

        let authed = service.authenticate(&outcome.access_token).await.unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let f = Fixture::new().await;
        let service = f.service();

        let cases = [
            SignupRequest::new("not-an-email", "alice", PASSWORD),
            SignupRequest::new("a@example.com", "al", PASSWORD),
            SignupRequest::new("a@example.com", "alice", "short1!"),
            SignupRequest::new("a@example.com", "alice", "NoDigitsHere!"),
            SignupRequest::new("a@example.com", "alice", PASSWORD).with_password_confirm("Other0rd!!"),
            SignupRequest::new("a@example.com", "alice", PASSWORD).with_display_name("x".repeat(51)),
        ];
        for request in cases {
            assert!(
                matches!(service.signup(&request).await, Err(AizevaError::Validation(_))),
                "{request:?}"
            );
        }
        assert!(f.identity.find_by_email("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicates() {
        let f = Fixture::new().await;
        let service = f.service();
        service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();

        let result = service
            .signup(&SignupRequest::new("other@example.com", "alice", PASSWORD))
            .await;
        assert!(matches!(result, Err(AizevaError::Conflict(_))));

        let result = service
            .signup(&SignupRequest::new("ALICE@example.com", "alice2", PASSWORD))
            .await;
        assert!(matches!(result, Err(AizevaError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_bootstrap_admin() {
        let f = Fixture::new().await;
        let emails = vec!["root@example.com".to_string()];
        let service = f.service().with_bootstrap_emails(&emails);

        let root = service
            .signup(&SignupRequest::new("Root@Example.com", "root", PASSWORD))
            .await
            .unwrap();
        assert!(root.is_admin);
        let user = service
            .signup(&SignupRequest::new("user@example.com", "user", PASSWORD))
            .await
            .unwrap();
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_signup_profile_failure_leaves_no_loginable_identity() {
        let f = Fixture::new().await;
        sqlx::query(
            "CREATE TRIGGER fail_profile BEFORE INSERT ON users
             BEGIN SELECT RAISE(ABORT, 'profile store down'); END;",
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let service = f.service();
        let result = service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await;
        assert!(result.is_err());

        assert!(f
            .identity
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(service.login("alice@example.com", PASSWORD, None).await.is_err());
    }

    // ========================================================================
    // Login / authenticate
    // ========================================================================

    #[tokio::test]
    async fn test_login_failures_are_generic() {
        let f = Fixture::new().await;
        let service = f.service();
        service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();

        let wrong = service
            .login("alice@example.com", "Wrong0rd!!", None)
            .await
            .unwrap_err();
        let unknown = service
            .login("ghost@example.com", PASSWORD, None)
            .await
            .unwrap_err();
        assert!(matches!(wrong, AizevaError::Auth(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());

        assert!(matches!(
            service.login("", "", None).await,
            Err(AizevaError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_deactivated_profile() {
        let f = Fixture::new().await;
        let service = f.service();
        let user = service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();
        sqlx::query("UPDATE users SET deleted_at = datetime('now') WHERE id = $1")
            .bind(&user.id)
            .execute(f.db.pool())
            .await
            .unwrap();

        let result = service.login("alice@example.com", PASSWORD, None).await;
        assert!(matches!(result, Err(AizevaError::Permission(_))));
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let f = Fixture::new().await;
        let service = f.service();
        service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();
        let outcome = service
            .login("alice@example.com", PASSWORD, None)
            .await
            .unwrap();

        assert!(service.logout(&outcome.session.id));
        let result = service.authenticate(&outcome.access_token).await;
        assert!(matches!(result, Err(AizevaError::Auth(_))));
    }

    #[tokio::test]
    async fn test_authenticate_sees_admin_changes() {
        let f = Fixture::new().await;
        let service = f.service();
        let user = service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();
        let outcome = service
            .login("alice@example.com", PASSWORD, None)
            .await
            .unwrap();

        UserRepository::new(f.db.pool()).promote(&user.id).await.unwrap();
        let authed = service.authenticate(&outcome.access_token).await.unwrap();
        assert!(authed.is_admin);
    }

    #[tokio::test]
    async fn test_token_from_other_session_rejected() {
        let f = Fixture::new().await;
        let service = f.service();
        let user = service
            .signup(&SignupRequest::new("alice@example.com", "alice", PASSWORD))
            .await
            .unwrap();

        let foreign = f.sessions.create();
        let token = f.tokens.issue(&user, &foreign.id).unwrap();
        let result = service.authenticate(&token).await;
        assert!(matches!(result, Err(AizevaError::Auth(_))));
    }
}
