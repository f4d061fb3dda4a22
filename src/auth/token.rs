//! JWT access tokens.
//!
//! Tokens are HS256-signed and name both the user (`sub`) and the session
//! they were issued into (`sid`). A token is only honoured while that
//! session is alive and still bound to the same user.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::{AizevaError, Result};

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Session the token was issued into.
    pub sid: String,
    /// Username at issue time.
    pub username: String,
    /// Admin flag at issue time. Authorization re-reads the profile.
    pub is_admin: bool,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl TokenIssuer {
    /// Create an issuer from a secret key.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Issue a token for `user` bound to `session_id`.
    pub fn issue(&self, user: &User, session_id: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = JwtClaims {
            sub: user.id.clone(),
            sid: session_id.to_string(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            AizevaError::Internal("failed to generate token".to_string())
        })
    }

    /// Verify a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                AizevaError::Auth("invalid or expired token".to_string())
            })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "0b9d6a8e-0000-4000-8000-000000000001".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            display_name: None,
            is_admin: true,
            created_at: "2024-01-01 00:00:00".to_string(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let token = issuer.issue(&user(), "session-1").unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user().id);
        assert_eq!(claims.sid, "session-1");
        assert_eq!(claims.username, "alice");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("secret-a", 3600)
            .issue(&user(), "s")
            .unwrap();
        let result = TokenIssuer::new("secret-b", 3600).verify(&token);
        assert!(matches!(result, Err(AizevaError::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("test-secret", 0);
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: "u".to_string(),
            sid: "s".to_string(),
            username: "u".to_string(),
            is_admin: false,
            iat: now - 7200,
            exp: now - 3600,
            jti: "j".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        assert!(issuer.verify("not.a.jwt").is_err());
    }
}
