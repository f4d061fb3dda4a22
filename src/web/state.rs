//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use crate::admin::{BoardAdminService, UserAdminService};
use crate::auth::{
    AuthService, CsrfGuard, IdentityProvider, LocalIdentityProvider, SessionStore, TokenIssuer,
};
use crate::board::BoardService;
use crate::config::Config;
use crate::Database;

/// Application state shared across handlers and middleware.
///
/// The session store and CSRF guard are built exactly once, here.
pub struct AppState {
    /// Database.
    pub db: Arc<Database>,
    /// Identity provider holding credentials.
    pub identity: Arc<dyn IdentityProvider>,
    /// Process-local session store.
    pub sessions: Arc<SessionStore>,
    /// CSRF guard over `sessions`.
    pub csrf: CsrfGuard,
    /// Access-token issuer.
    pub tokens: TokenIssuer,
    /// Loaded configuration.
    pub config: Config,
}

impl AppState {
    /// Build the state with the local identity provider.
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(db.pool().clone()));
        Self::with_identity_provider(db, identity, config)
    }

    /// Build the state around a given identity provider.
    pub fn with_identity_provider(
        db: Arc<Database>,
        identity: Arc<dyn IdentityProvider>,
        config: Config,
    ) -> Self {
        let sessions = Arc::new(
            SessionStore::new(Duration::from_secs(config.auth.session_ttl_secs))
                .with_anonymous_limits(
                    Duration::from_secs(config.auth.anonymous_session_ttl_secs),
                    config.auth.max_anonymous_sessions,
                ),
        );
        let csrf = CsrfGuard::new(sessions.clone());
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.jwt_expiry_secs);

        Self {
            db,
            identity,
            sessions,
            csrf,
            tokens,
            config,
        }
    }

    /// Authentication service over this state.
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.db,
            self.identity.as_ref(),
            &self.sessions,
            &self.csrf,
            &self.tokens,
        )
        .with_bootstrap_emails(&self.config.admin.bootstrap_emails)
    }

    /// Board, post and comment service.
    pub fn boards(&self) -> BoardService<'_> {
        BoardService::new(&self.db)
    }

    /// User administration service.
    pub fn user_admin(&self) -> UserAdminService<'_> {
        UserAdminService::new(&self.db, self.identity.as_ref(), &self.sessions)
            .with_self_demotion(self.config.admin.allow_self_demotion)
    }

    /// Board administration service.
    pub fn board_admin(&self) -> BoardAdminService<'_> {
        BoardAdminService::new(&self.db)
    }
}
