//! Dashboard sessions
//!
//! Sessions live only in process memory. Handlers talk to the [`SessionStore`]
//! trait so the backing map can be swapped for an external cache.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Soft lifetime of a session, measured from its last activity stamp
pub const SESSION_TTL_HOURS: i64 = 24;

/// Cloudflare account the operator picked in the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentAccount {
    pub id: String,
    pub name: String,
    pub selected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed by every change made through [`SessionStore::update`]
    pub last_active: DateTime<Utc>,
    pub current_account: Option<CurrentAccount>,
}

impl Session {
    pub fn new(username: &str) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token(now),
            username: username.to_string(),
            created_at: now,
            last_active: now,
            current_account: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_active > Duration::hours(SESSION_TTL_HOURS)
    }
}

/// Why a token did not resolve to a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLookupError {
    Missing,
    Expired,
}

impl std::fmt::Display for SessionLookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionLookupError::Missing => write!(f, "session not found"),
            SessionLookupError::Expired => write!(f, "session expired"),
        }
    }
}

pub trait SessionStore: Send + Sync {
    /// Resolve a token. Expired sessions are evicted and reported as such.
    fn get(&self, token: &str) -> Result<Session, SessionLookupError>;

    /// Insert or replace the session stored under `session.token`.
    fn set(&self, session: Session);

    /// Apply `change` to a live session under one write lock and return the
    /// result. Never recreates a session that was deleted or has expired.
    fn update(
        &self,
        token: &str,
        change: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, SessionLookupError>;

    /// Returns whether a session was removed.
    fn delete(&self, token: &str) -> bool;

    /// Drop every expired session and return how many were removed.
    fn sweep_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, token: &str) -> Result<Session, SessionLookupError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read();
            match sessions.get(token) {
                None => return Err(SessionLookupError::Missing),
                Some(session) if !session.is_expired_at(now) => return Ok(session.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a concurrent selection may have refreshed it.
        let mut sessions = self.sessions.write();
        match sessions.get(token) {
            Some(session) if session.is_expired_at(now) => {
                sessions.remove(token);
                tracing::debug!("Evicted expired session");
                Err(SessionLookupError::Expired)
            }
            Some(session) => Ok(session.clone()),
            None => Err(SessionLookupError::Missing),
        }
    }

    fn set(&self, session: Session) {
        self.sessions.write().insert(session.token.clone(), session);
    }

    fn update(
        &self,
        token: &str,
        change: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, SessionLookupError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(token).ok_or(SessionLookupError::Missing)?;
        if session.is_expired_at(now) {
            sessions.remove(token);
            return Err(SessionLookupError::Expired);
        }

        change(session);
        session.last_active = now;
        Ok(session.clone())
    }

    fn delete(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Opaque token: random hex followed by the creation timestamp
fn generate_token(now: DateTime<Utc>) -> String {
    let raw: [u8; 16] = rand::random();
    format!("{}_{}", hex::encode(raw), now.format("%Y%m%d%H%M%S"))
}
