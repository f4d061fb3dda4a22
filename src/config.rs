//! Configuration module for AIZEVA.

use serde::Deserialize;
use std::path::Path;

use crate::{AizevaError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Rate limit for the login endpoint (requests per minute per client IP).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_login_rate_limit() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            login_rate_limit: default_login_rate_limit(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite://...` or `postgres://...`).
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/aizeva.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Authentication and session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Idle lifetime of a session nobody has logged into, in seconds.
    #[serde(default = "default_anonymous_session_ttl")]
    pub anonymous_session_ttl_secs: u64,
    /// Most anonymous sessions kept at once; the oldest are evicted beyond it.
    #[serde(default = "default_max_anonymous_sessions")]
    pub max_anonymous_sessions: usize,
    /// Mark cookies `Secure` (requires HTTPS in front).
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_jwt_expiry() -> u64 {
    24 * 60 * 60
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_anonymous_session_ttl() -> u64 {
    15 * 60
}

fn default_max_anonymous_sessions() -> usize {
    10_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_secs: default_jwt_expiry(),
            session_ttl_secs: default_session_ttl(),
            anonymous_session_ttl_secs: default_anonymous_session_ttl(),
            max_anonymous_sessions: default_max_anonymous_sessions(),
            secure_cookies: false,
        }
    }
}

/// Admin policy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Allow an admin to demote themselves while other admins exist.
    #[serde(default)]
    pub allow_self_demotion: bool,
    /// Emails whose signup creates an admin profile (first-admin bootstrap).
    #[serde(default)]
    pub bootstrap_emails: Vec<String>,
}

impl AdminConfig {
    /// Check if a signup with `email` should become an admin.
    pub fn is_bootstrap_email(&self, email: &str) -> bool {
        self.bootstrap_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email.trim()))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/aizeva.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Admin policy.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AizevaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AizevaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `AIZEVA_JWT_SECRET`: JWT signing secret
    /// - `AIZEVA_DATABASE_URL`: database connection URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("AIZEVA_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.auth.jwt_secret = jwt_secret;
            }
        }
        if let Ok(url) = std::env::var("AIZEVA_DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(AizevaError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via AIZEVA_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(AizevaError::Config(
                "session_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.anonymous_session_ttl_secs == 0 || self.auth.max_anonymous_sessions == 0 {
            return Err(AizevaError::Config(
                "anonymous_session_ttl_secs and max_anonymous_sessions must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.server.login_rate_limit, 5);

        assert_eq!(config.database.url, "sqlite://data/aizeva.db");
        assert_eq!(config.database.max_connections, 10);

        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.jwt_expiry_secs, 86400);
        assert_eq!(config.auth.session_ttl_secs, 86400);
        assert_eq!(config.auth.anonymous_session_ttl_secs, 900);
        assert_eq!(config.auth.max_anonymous_sessions, 10_000);
        assert!(!config.auth.secure_cookies);

        assert!(!config.admin.allow_self_demotion);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/aizeva.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173"]
login_rate_limit = 10

[database]
url = "postgres://localhost/aizeva"
max_connections = 4

[auth]
jwt_secret = "test-secret-key"
jwt_expiry_secs = 600
session_ttl_secs = 1200
secure_cookies = true

[admin]
allow_self_demotion = true
bootstrap_emails = ["Root@Example.com"]

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.server.login_rate_limit, 10);
        assert_eq!(config.database.url, "postgres://localhost/aizeva");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.auth.jwt_secret, "test-secret-key");
        assert_eq!(config.auth.jwt_expiry_secs, 600);
        assert_eq!(config.auth.session_ttl_secs, 1200);
        assert!(config.auth.secure_cookies);
        assert!(config.admin.allow_self_demotion);
        assert!(config.admin.is_bootstrap_email("root@example.com"));
        assert!(!config.admin.is_bootstrap_email("other@example.com"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("[server\nport = ");
        assert!(matches!(result, Err(AizevaError::Config(_))));
    }

    #[test]
    fn test_validate_requires_jwt_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_session_ttl() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.auth.session_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_anonymous_limits() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());

        config.auth.max_anonymous_sessions = 0;
        assert!(config.validate().is_err());

        config.auth.max_anonymous_sessions = 10;
        config.auth.anonymous_session_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\njwt_secret = \"from-file\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-file");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/config.toml");
        assert!(matches!(result, Err(AizevaError::Io(_))));
    }
}
