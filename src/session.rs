// Session persistence: the credential bundle written after a successful
// login and restored on every later invocation. The store is a plain
// value handed to the dispatcher, so tests can point it at a scratch file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Default session file, relative to the working directory.
pub const SESSION_FILE: &str = "session.json";

/// The user record as returned by the service. `id` and `name` are the
/// fields the CLI consumes; everything else is carried through untouched.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Persisted credential bundle. Written wholesale on login, never mutated
/// in place.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub me: UserRecord,
    pub access_token: String,
}

/// Returned when a command needs authentication and no usable session is
/// on disk. Displays as the message the CLI prints.
#[derive(Debug, Error)]
#[error("Need to login")]
pub struct SessionMissing;

/// Reads and writes the session file.
pub struct SessionStore {
    path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_FILE)
    }
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// Serialize the session to disk, replacing any prior content.
    pub fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session).context("Serializing session")?;
        fs::write(&self.path, data)
            .with_context(|| format!("Writing session file {}", self.path.display()))?;
        Ok(())
    }

    /// Read the session back. Absent, unreadable or malformed files all
    /// come back as `None`; the caller treats that as "not logged in".
    /// An empty access token is rejected the same way, since it could
    /// never authenticate a request.
    pub fn load(&self) -> Option<Session> {
        let data = fs::read_to_string(&self.path).ok()?;
        let session: Session = serde_json::from_str(&data).ok()?;
        if session.access_token.is_empty() {
            return None;
        }
        Some(session)
    }

    /// `load` for callers that require a session.
    pub fn restore(&self) -> Result<Session, SessionMissing> {
        self.load().ok_or(SessionMissing)
    }
}
