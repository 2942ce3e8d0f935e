//! `SessionStore` implementations.
//!
//! Both stores keep the same two keys: `token` (the raw access token) and
//! `user` (the user record serialized as a JSON string).  `save` writes both
//! and `clear` removes both, so they can never get out of step.
//!
//! `FileSessionStore` persists the map as a small JSON object:
//!
//! ```json
//! { "token": "eyJhbGciOi...", "user": "{\"id\":\"65f0...\",\"role\":\"doctor\"}" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use hospital_core::User;
use tracing::{debug, warn};

use crate::application::session::{SessionStore, StorageError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

type SessionMap = BTreeMap<String, String>;

fn user_from(map: &SessionMap) -> Result<Option<User>, StorageError> {
    map.get(USER_KEY)
        .map(|raw| serde_json::from_str(raw))
        .transpose()
        .map_err(StorageError::from)
}

fn put_user(map: &mut SessionMap, user: &User) -> Result<(), StorageError> {
    map.insert(USER_KEY.to_string(), serde_json::to_string(user)?);
    Ok(())
}

// ── Memory ────────────────────────────────────────────────────────────────────

/// Session kept in process memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<SessionMap>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of `key`, for asserting on exactly what was persisted.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(TOKEN_KEY).cloned())
    }

    fn user(&self) -> Result<Option<User>, StorageError> {
        user_from(&self.lock())
    }

    fn save(&self, token: &str, user: &User) -> Result<(), StorageError> {
        let mut entries = self.lock();
        put_user(&mut entries, user)?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        Ok(())
    }

    fn save_user(&self, user: &User) -> Result<(), StorageError> {
        put_user(&mut self.lock(), user)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.lock();
        entries.remove(TOKEN_KEY);
        entries.remove(USER_KEY);
        Ok(())
    }
}

// ── File ──────────────────────────────────────────────────────────────────────

/// Session persisted as a JSON file, surviving restarts.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SessionMap, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(SessionMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionMap::new()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, map: &SessionMap) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Read-modify-write.  Unparseable content is replaced rather than
    /// blocking the write, so a corrupt file never outlives the next save.
    fn update(
        &self,
        change: impl FnOnce(&mut SessionMap) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = match self.read() {
            Ok(map) => map,
            Err(StorageError::Corrupt(e)) => {
                warn!(path = %self.path.display(), "discarding corrupt session file: {e}");
                SessionMap::new()
            }
            Err(e) => return Err(e),
        };
        change(&mut map)?;
        self.write(&map)
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.get(TOKEN_KEY).cloned())
    }

    fn user(&self) -> Result<Option<User>, StorageError> {
        user_from(&self.read()?)
    }

    fn save(&self, token: &str, user: &User) -> Result<(), StorageError> {
        self.update(|map| {
            put_user(map, user)?;
            map.insert(TOKEN_KEY.to_string(), token.to_string());
            Ok(())
        })?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn save_user(&self, user: &User) -> Result<(), StorageError> {
        self.update(|map| put_user(map, user))
    }

    fn clear(&self) -> Result<(), StorageError> {
        {
            let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
            self.write(&SessionMap::new())?;
        }
        debug!(path = %self.path.display(), "session cleared");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
