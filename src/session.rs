//! Per-login sessions keyed by opaque bearer tokens.
//!
//! The raw token is handed out once by `create`; only its SHA-256 hash is
//! kept, and lookups compare hashes in constant time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::accounts::Account;
use crate::wells::Dataset;

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

struct Session {
    token_hash: [u8; 32],
    username: String,
    display_name: String,
    dataset: Arc<Dataset>,
    created_at: DateTime<Utc>,
    last_seen: Instant,
}

/// What handlers see of a session, injected by the auth middleware.
#[derive(Clone)]
pub struct SessionView {
    pub session_id: String,
    pub username: String,
    pub display_name: String,
    pub dataset: Arc<Dataset>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for SessionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionView")
            .field("session_id", &self.session_id)
            .field("username", &self.username)
            .field("dataset_rows", &self.dataset.len())
            .finish()
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Start a session for `account` bound to a dataset snapshot. Returns the
    /// raw bearer token.
    pub fn create(&self, account: &Account, dataset: Arc<Dataset>) -> String {
        let token = generate_token();
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session {
            token_hash: hash_token(&token),
            username: account.username.clone(),
            display_name: account.name.clone(),
            dataset,
            created_at: Utc::now(),
            last_seen: Instant::now(),
        };

        let mut sessions = self.write();
        sessions.retain(|_, s| s.last_seen.elapsed() < self.idle_timeout);
        sessions.insert(session_id.clone(), session);
        tracing::info!(session_id = %session_id, active = sessions.len(), "Session created");
        token
    }

    /// Resolve a token to its session, refreshing the idle timer. Expired
    /// sessions are dropped and yield `None`.
    pub fn get(&self, token: &str) -> Option<SessionView> {
        let token_hash = hash_token(token);
        let mut sessions = self.write();
        let session_id = find_session(&sessions, &token_hash)?;

        let expired = sessions
            .get(&session_id)
            .is_some_and(|s| s.last_seen.elapsed() >= self.idle_timeout);
        if expired {
            sessions.remove(&session_id);
            tracing::info!(session_id = %session_id, "Session expired");
            return None;
        }

        let session = sessions.get_mut(&session_id)?;
        session.last_seen = Instant::now();
        Some(SessionView {
            session_id,
            username: session.username.clone(),
            display_name: session.display_name.clone(),
            dataset: Arc::clone(&session.dataset),
            created_at: session.created_at,
        })
    }

    /// End the session owning `token`. Returns whether one existed.
    pub fn remove(&self, token: &str) -> bool {
        let token_hash = hash_token(token);
        let mut sessions = self.write();
        match find_session(&sessions, &token_hash) {
            Some(session_id) => {
                sessions.remove(&session_id);
                tracing::info!(session_id = %session_id, "Session ended");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        // A poisoned map only means a panic elsewhere mid-update; the entries
        // themselves are still consistent.
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn find_session(sessions: &HashMap<String, Session>, token_hash: &[u8; 32]) -> Option<String> {
    sessions
        .iter()
        .find(|(_, s)| bool::from(s.token_hash.ct_eq(token_hash)))
        .map(|(id, _)| id.clone())
}
