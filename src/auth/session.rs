//! Process-local session store.
//!
//! Every browser gets a session on its first request. The session carries
//! the CSRF secret and, after login, the authenticated user id. Sessions live
//! only in this process's memory and are lost on restart.
//!
//! Anonymous sessions are cheap to mint, so they are kept on a short leash:
//! they expire after a short idle period (pushed forward whenever the session
//! is presented again) and their number is capped, the oldest being evicted
//! first. Authenticated sessions use the full TTL and are never evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::{debug, warn};

/// Length of the per-session CSRF secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Default idle lifetime of an anonymous session.
pub const DEFAULT_ANONYMOUS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default cap on the number of anonymous sessions.
pub const DEFAULT_MAX_ANONYMOUS: usize = 10_000;

/// Session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session id, sent as the session cookie.
    pub id: String,
    /// Random secret the CSRF token is derived from.
    pub secret: [u8; SECRET_LEN],
    /// Authenticated user, if logged in.
    pub user_id: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Expiry. Fixed for authenticated sessions, sliding for anonymous ones.
    pub expires_at: DateTime<Utc>,
}

fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default()
}

impl Session {
    fn new(ttl: Duration, user_id: Option<String>) -> Self {
        let mut rng = rand::rng();
        let mut id_bytes = [0u8; 32];
        rng.fill_bytes(&mut id_bytes);
        let mut secret = [0u8; SECRET_LEN];
        rng.fill_bytes(&mut secret);

        Self {
            id: URL_SAFE_NO_PAD.encode(id_bytes),
            secret,
            user_id,
            created_at: Utc::now(),
            expires_at: expiry_from_now(ttl),
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if no user is bound to the session.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Debug, Default)]
struct Sessions {
    by_id: HashMap<String, Session>,
    /// Anonymous session ids, oldest first. May hold ids that have since
    /// been removed or bound to a user; those are skipped on eviction.
    anonymous: VecDeque<String>,
    anonymous_count: usize,
}

impl Sessions {
    fn remove(&mut self, id: &str) -> Option<Session> {
        let session = self.by_id.remove(id)?;
        if session.is_anonymous() {
            self.anonymous_count -= 1;
        }
        Some(session)
    }

    fn retain(&mut self, mut keep: impl FnMut(&Session) -> bool) -> usize {
        let before = self.by_id.len();
        let mut dropped_anonymous = 0;
        self.by_id.retain(|_, s| {
            let kept = keep(s);
            if !kept && s.is_anonymous() {
                dropped_anonymous += 1;
            }
            kept
        });
        self.anonymous_count -= dropped_anonymous;
        before - self.by_id.len()
    }

    fn evict_oldest_anonymous(&mut self) -> bool {
        while let Some(id) = self.anonymous.pop_front() {
            if self.by_id.get(&id).is_some_and(Session::is_anonymous) {
                self.remove(&id);
                return true;
            }
        }
        false
    }

    fn compact_queue(&mut self) {
        let by_id = &self.by_id;
        self.anonymous
            .retain(|id| by_id.get(id).is_some_and(Session::is_anonymous));
    }
}

/// In-memory session store shared by the whole process.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<Sessions>,
    ttl: Duration,
    anonymous_ttl: Duration,
    max_anonymous: usize,
}

impl SessionStore {
    /// Create an empty store whose authenticated sessions live for `ttl`.
    ///
    /// Anonymous sessions get the default limits, never outliving `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            ttl,
            anonymous_ttl: DEFAULT_ANONYMOUS_TTL.min(ttl),
            max_anonymous: DEFAULT_MAX_ANONYMOUS,
        }
    }

    /// Set the idle lifetime and the cap for anonymous sessions.
    pub fn with_anonymous_limits(mut self, ttl: Duration, max: usize) -> Self {
        self.anonymous_ttl = ttl.min(self.ttl);
        self.max_anonymous = max.max(1);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Sessions> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sessions> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a new anonymous session, evicting the oldest anonymous
    /// session when the cap is reached.
    pub fn create(&self) -> Session {
        let session = Session::new(self.anonymous_ttl, None);
        let mut sessions = self.write();

        if sessions.anonymous_count >= self.max_anonymous {
            let expired = sessions.retain(|s| !s.is_expired());
            if expired > 0 {
                sessions.compact_queue();
            }
            if sessions.anonymous_count >= self.max_anonymous
                && sessions.evict_oldest_anonymous()
            {
                warn!(
                    max = self.max_anonymous,
                    "Anonymous session cap reached, evicted the oldest"
                );
            }
        }

        if sessions.anonymous.len() > 2 * self.max_anonymous {
            sessions.compact_queue();
        }
        sessions.by_id.insert(session.id.clone(), session.clone());
        sessions.anonymous.push_back(session.id.clone());
        sessions.anonymous_count += 1;
        debug!("Session created");
        session
    }

    /// Look up a live session. Expired sessions are removed and not returned.
    ///
    /// Presenting an anonymous session pushes its expiry forward.
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.read().by_id.get(id).cloned()?;
        if session.is_expired() {
            self.write().remove(id);
            return None;
        }
        if !session.is_anonymous() {
            return Some(session);
        }

        let mut sessions = self.write();
        let stored = sessions.by_id.get_mut(id)?;
        if stored.is_anonymous() {
            stored.expires_at = expiry_from_now(self.anonymous_ttl);
        }
        Some(stored.clone())
    }

    /// Replace `old_id` (if any) with a fresh session bound to `user_id`.
    ///
    /// Used at login so a session id planted before authentication is never
    /// promoted to an authenticated one.
    pub fn rotate(&self, old_id: Option<&str>, user_id: &str) -> Session {
        let session = Session::new(self.ttl, Some(user_id.to_string()));
        let mut sessions = self.write();
        if let Some(old_id) = old_id {
            sessions.remove(old_id);
        }
        sessions.by_id.insert(session.id.clone(), session.clone());
        session
    }

    /// Remove a session. Returns true if it existed.
    pub fn destroy(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    /// Remove every session bound to `user_id`. Returns how many were removed.
    pub fn destroy_for_user(&self, user_id: &str) -> usize {
        self.write()
            .retain(|s| s.user_id.as_deref() != Some(user_id))
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.write();
        let removed = sessions.retain(|s| !s.is_expired());
        sessions.compact_queue();
        removed
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    /// Number of stored anonymous sessions.
    pub fn anonymous_len(&self) -> usize {
        self.read().anonymous_count
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().by_id.is_empty()
    }
}
