//! Signed-in session state and where it is kept between runs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use domain::models::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Session file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A bearer token plus the profile it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Persistence for the current session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the session for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Stores the session as a JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written session behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&serde_json::to_vec(session)?)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Owns the current session and keeps its store in sync.
///
/// Lifecycle: [`init`](Self::init) on start-up, [`set`](Self::set) after
/// login or registration, [`clear`](Self::clear) on logout or when the
/// server rejects the token.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            current: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// Restores the persisted session. An unreadable one is discarded.
    pub fn init(&self) -> Option<Session> {
        let restored = match self.store.load() {
            Ok(session) => session.filter(Session::is_authenticated),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to remove unreadable session");
                }
                None
            }
        };

        debug!(restored = restored.is_some(), "Session initialized");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = restored.clone();
        restored
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current()
            .map(|s| s.is_authenticated())
            .unwrap_or(false)
    }

    pub fn set(&self, session: Session) -> Result<(), StoreError> {
        self.store.save(&session)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Replaces the cached profile, keeping the token.
    pub fn update_user(&self, user: User) -> Result<(), StoreError> {
        match self.current() {
            Some(session) => self.set(Session { user, ..session }),
            None => Ok(()),
        }
    }

    /// Forgets the session in memory even if the store fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::Role;
    use uuid::Uuid;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            college_id: "21CS042".to_string(),
            password_hash: String::new(),
            role: Role::Member,
            is_verified: true,
            phone: None,
            year: None,
            branch: None,
            batch: None,
            project_ideas: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        assert!(!Session::new("", user("Asha")).is_authenticated());
        assert!(Session::new("abc", user("Asha")).is_authenticated());
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());

        let session = Session::new("token-1", user("Asha"));
        store.save(&session).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "token-1");
        assert_eq!(loaded.user.id, session.user.id);
        assert!(!store.temp_path().exists());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_never_writes_password_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        let mut u = user("Asha");
        u.password_hash = "$argon2id$secret".to_string();
        store.save(&Session::new("t", u)).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("argon2id"));
    }

    #[test]
    fn test_init_discards_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let manager = SessionManager::new(FileSessionStore::new(&path));
        assert!(manager.init().is_none());
        assert!(!manager.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_manager_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let manager = SessionManager::new(FileSessionStore::new(&path));
        assert!(manager.init().is_none());

        manager.set(Session::new("token-1", user("Asha"))).unwrap();
        assert_eq!(manager.token().as_deref(), Some("token-1"));

        // A fresh manager over the same file restores the session.
        let restored = SessionManager::new(FileSessionStore::new(&path));
        assert_eq!(restored.init().unwrap().token, "token-1");

        restored.update_user(user("Ravi")).unwrap();
        assert_eq!(restored.current().unwrap().user.name, "Ravi");
        assert_eq!(restored.token().as_deref(), Some("token-1"));

        restored.clear().unwrap();
        assert!(restored.current().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_update_user_without_session_is_noop() {
        let manager = SessionManager::in_memory();
        manager.update_user(user("Asha")).unwrap();
        assert!(manager.current().is_none());
    }
}
