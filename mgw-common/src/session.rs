//! Authentication session context
//!
//! The report flow only ever reads the session. Writing it (login/logout)
//! goes through [`SessionStore`], which persists the session as JSON under
//! the root folder and announces the change on the [`EventBus`].

use crate::events::{EventBus, MgwEvent};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Logged-in user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub username: String,
    pub email: String,
    pub user_id: String,
}

/// Read-only view of the current session
pub trait SessionContext: Send + Sync {
    fn get_auth(&self) -> Option<AuthSession>;

    fn is_authenticated(&self) -> bool {
        self.get_auth().is_some()
    }
}

/// In-memory session, for tests and embedders that own persistence
#[derive(Debug, Default)]
pub struct MemorySession {
    auth: RwLock<Option<AuthSession>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_in(auth: AuthSession) -> Self {
        Self {
            auth: RwLock::new(Some(auth)),
        }
    }

    pub fn set(&self, auth: Option<AuthSession>) {
        match self.auth.write() {
            Ok(mut guard) => *guard = auth,
            Err(poisoned) => *poisoned.into_inner() = auth,
        }
    }
}

impl SessionContext for MemorySession {
    fn get_auth(&self) -> Option<AuthSession> {
        match self.auth.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// File-backed session store
///
/// The file is re-read on every lookup so that several processes sharing a
/// root folder observe each other's login/logout.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    event_bus: EventBus,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, event_bus: EventBus) -> Self {
        Self {
            path: path.into(),
            event_bus,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store the session and broadcast `AuthStateChanged`
    pub fn set_auth(&self, auth: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(auth)?;
        std::fs::write(&self.path, json)?;
        info!(username = %auth.username, user_id = %auth.user_id, "Session stored");

        self.event_bus.emit_lossy(MgwEvent::AuthStateChanged {
            authenticated: true,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Remove the session and broadcast `AuthStateChanged`
    pub fn clear_auth(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Session cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session to clear");
            }
            Err(e) => return Err(e.into()),
        }

        self.event_bus.emit_lossy(MgwEvent::AuthStateChanged {
            authenticated: false,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    fn load(&self) -> Option<AuthSession> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<AuthSession>(&content) {
            Ok(auth) if !auth.user_id.trim().is_empty() => Some(auth),
            Ok(_) => {
                warn!("Session file has empty user_id, treating as logged out");
                None
            }
            Err(e) => {
                warn!("Corrupt session file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl SessionContext for SessionStore {
    fn get_auth(&self) -> Option<AuthSession> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthSession {
        AuthSession {
            username: "ranger".to_string(),
            email: "ranger@example.org".to_string(),
            user_id: "42".to_string(),
        }
    }

    #[test]
    fn test_memory_session_defaults_to_logged_out() {
        let session = MemorySession::new();
        assert!(!session.is_authenticated());
        assert!(session.get_auth().is_none());

        session.set(Some(sample()));
        assert!(session.is_authenticated());
        assert_eq!(session.get_auth().unwrap().user_id, "42");
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"), EventBus::new(4));

        assert!(!store.is_authenticated());
        store.set_auth(&sample()).unwrap();
        assert_eq!(store.get_auth(), Some(sample()));

        store.clear_auth().unwrap();
        assert!(store.get_auth().is_none());
        // Clearing twice is fine
        store.clear_auth().unwrap();
    }

    #[test]
    fn test_corrupt_session_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(path, EventBus::new(4));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_and_logout_broadcast_auth_changes() {
        let dir = tempfile::tempdir().unwrap();
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let store = SessionStore::new(dir.path().join("nested/session.json"), bus);

        store.set_auth(&sample()).unwrap();
        store.clear_auth().unwrap();

        match rx.recv().await.unwrap() {
            MgwEvent::AuthStateChanged { authenticated, .. } => assert!(authenticated),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            MgwEvent::AuthStateChanged { authenticated, .. } => assert!(!authenticated),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
