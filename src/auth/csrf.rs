//! CSRF protection.
//!
//! The token is `base64url(HMAC-SHA256(session secret, session id))`. It is
//! stable for the life of the session and is checked against the session
//! named by the cookie, so a token lifted from one session is useless with
//! any other. Exactly one guard exists per process; it lives in the
//! application state next to the session store it reads from.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use super::session::{Session, SessionStore};
use crate::{AizevaError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Name of the request/response header carrying the token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Name of the form field carrying the token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Issues and verifies per-session CSRF tokens.
#[derive(Debug)]
pub struct CsrfGuard {
    sessions: Arc<SessionStore>,
}

impl CsrfGuard {
    /// Create a guard reading sessions from `sessions`.
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    fn mac(session: &Session) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&session.secret)
            .map_err(|e| AizevaError::Internal(format!("csrf key: {e}")))?;
        mac.update(session.id.as_bytes());
        Ok(mac)
    }

    /// Token for `session`.
    pub fn issue(&self, session: &Session) -> Result<String> {
        let tag = Self::mac(session)?.finalize().into_bytes();
        Ok(URL_SAFE_NO_PAD.encode(tag))
    }

    /// Check `submitted` against the session named by `session_id`.
    ///
    /// A missing session, missing token or mismatch is a `Permission` error.
    pub fn verify(&self, session_id: Option<&str>, submitted: Option<&str>) -> Result<()> {
        let session = session_id
            .and_then(|id| self.sessions.get(id))
            .ok_or_else(|| AizevaError::Permission("CSRF: Missing session".to_string()))?;

        let submitted = submitted
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AizevaError::Permission("CSRF: Missing token".to_string()))?;

        let invalid = || AizevaError::Permission("CSRF: Invalid token".to_string());
        let decoded = URL_SAFE_NO_PAD.decode(submitted).map_err(|_| invalid())?;

        Self::mac(&session)?.verify_slice(&decoded).map_err(|_| {
            debug!("CSRF token mismatch");
            invalid()
        })
    }
}
