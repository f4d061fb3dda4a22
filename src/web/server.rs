//! Web server for AIZEVA.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::{AizevaError, Database, Result};

use super::middleware::LoginRateLimiter;
use super::router::create_router;
use super::state::AppState;

/// How often expired sessions are swept.
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 600;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Login rate limiter.
    login_limiter: Arc<LoginRateLimiter>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: Config, db: Arc<Database>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| AizevaError::Config(format!("invalid server address: {e}")))?;

        let login_limiter = Arc::new(LoginRateLimiter::new(config.server.login_rate_limit));
        let app_state = Arc::new(AppState::new(db, config));

        Ok(Self {
            addr,
            app_state,
            login_limiter,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state, for callers that drive the services directly.
    pub fn state(&self) -> Arc<AppState> {
        self.app_state.clone()
    }

    /// Start the session cleanup background task.
    fn start_session_cleanup_task(sessions: Arc<SessionStore>) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let removed = sessions.cleanup_expired();
                if removed > 0 {
                    tracing::info!(removed, "Cleaned up expired sessions");
                } else {
                    tracing::debug!("No expired sessions to clean up");
                }
            }
        });
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router, SocketAddr)> {
        let sessions = self.app_state.sessions.clone();
        let router = create_router(self.app_state, self.login_limiter.clone());

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start background tasks after successful bind
        Self::start_session_cleanup_task(sessions);
        self.login_limiter.start_cleanup_task();

        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, router, local_addr))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let (listener, router, _) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
