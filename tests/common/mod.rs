//! Test helpers for Web API tests.
//!
//! A [`TestApp`] owns one router and its state. Each [`Browser`] is a
//! separate `TestServer` over that router with its own cookie jar, so a
//! test can act as several users at once.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use aizeva::board::{Board, BoardRepository, NewBoard, WritePermission};
use aizeva::config::Config;
use aizeva::web::middleware::LoginRateLimiter;
use aizeva::web::{create_router, AppState};
use aizeva::Database;

/// Password that satisfies the policy.
pub const PASSWORD: &str = "Passw0rd!23";

/// Email that signs up as an admin.
pub const ADMIN_EMAIL: &str = "admin@example.com";

const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.login_rate_limit = 100;
    config.auth.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.admin.bootstrap_emails = vec![ADMIN_EMAIL.to_string()];
    config
}

/// Router and state over an in-memory database.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    /// Create an app with the test configuration.
    pub async fn new() -> Self {
        Self::with_config(create_test_config()).await
    }

    /// Create an app with a custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        Self::with_database(db, config)
    }

    /// Create an app over an existing database.
    pub fn with_database(db: Database, config: Config) -> Self {
        let limiter = Arc::new(LoginRateLimiter::new(config.server.login_rate_limit));
        let state = Arc::new(AppState::new(Arc::new(db), config));
        let router = create_router(state.clone(), limiter);
        Self { router, state }
    }

    /// Open a new browser with a fresh session.
    pub async fn browser(&self) -> Browser {
        Browser::new(self.router.clone()).await
    }

    /// Create a board directly in the store.
    pub async fn create_board(&self, slug: &str, permission: WritePermission) -> Board {
        BoardRepository::new(self.state.db.pool())
            .create(&NewBoard::new(slug, slug.to_uppercase()).with_write_permission(permission))
            .await
            .expect("Failed to create board")
    }

    /// A browser logged in as a freshly signed-up user.
    pub async fn member(&self, username: &str) -> Browser {
        let mut browser = self.browser().await;
        browser
            .signup(&format!("{username}@example.com"), username)
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        browser.login(&format!("{username}@example.com"), PASSWORD).await;
        browser
    }

    /// A browser logged in as the bootstrap admin.
    pub async fn admin(&self) -> Browser {
        let mut browser = self.browser().await;
        browser
            .signup(ADMIN_EMAIL, "admin")
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        browser.login(ADMIN_EMAIL, PASSWORD).await;
        browser
    }
}

/// One client with its own cookies and CSRF token.
pub struct Browser {
    pub server: TestServer,
    pub csrf: String,
}

impl Browser {
    /// Start a session and fetch its CSRF token.
    pub async fn new(router: Router) -> Self {
        let server = TestServer::builder()
            .save_cookies()
            .build(router)
            .expect("Failed to create test server");

        let response = server.get("/auth/csrf-token").await;
        response.assert_status_ok();
        let csrf = response.json::<Value>()["data"]["csrf_token"]
            .as_str()
            .expect("csrf token")
            .to_string();

        Self { server, csrf }
    }

    fn csrf_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.csrf).expect("csrf header")
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(path).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(CSRF_HEADER, self.csrf_value())
            .json(&body)
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.server
            .put(path)
            .add_header(CSRF_HEADER, self.csrf_value())
            .json(&body)
            .await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.server
            .delete(path)
            .add_header(CSRF_HEADER, self.csrf_value())
            .await
    }

    /// Sign up with [`PASSWORD`].
    pub async fn signup(&self, email: &str, username: &str) -> TestResponse {
        self.post(
            "/auth/signup",
            json!({
                "email": email,
                "username": username,
                "password": PASSWORD,
                "password_confirm": PASSWORD,
            }),
        )
        .await
    }

    /// Log in and adopt the new session's CSRF token.
    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        let response = self
            .post("/auth/login", json!({ "email": email, "password": password }))
            .await;
        if response.status_code().is_success() {
            let body: Value = response.json();
            if let Some(token) = body["data"]["csrf_token"].as_str() {
                self.csrf = token.to_string();
            }
        }
        response
    }

    /// Create a post and return its id.
    pub async fn create_post(&self, slug: &str, title: &str, body: &str) -> i64 {
        let response = self
            .post(
                &format!("/boards/{slug}/posts"),
                json!({ "title": title, "body": body }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("post id")
    }

    /// Current user's id.
    pub async fn user_id(&self) -> String {
        let response = self.get("/auth/me").await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["id"]
            .as_str()
            .expect("user id")
            .to_string()
    }
}
