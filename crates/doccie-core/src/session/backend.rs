// SPDX-License-Identifier: Apache-2.0

//! Storage backends for the persisted session records.
//!
//! A backend is a tiny named-record store: two records (`tokenInfo` and
//! `userInfo`) hold JSON strings. [`SessionStore`](super::SessionStore)
//! decides what goes in them; backends only move strings around.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::DoccieError;

/// Keyring service name for storing session records.
#[cfg(feature = "keyring")]
pub const KEYRING_SERVICE: &str = "doccie";

/// A named-record key/value store.
///
/// `remove` must succeed when the record does not exist.
pub trait SessionBackend: Send {
    /// Reads a record. Returns `None` if it does not exist.
    fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Creates or replaces a record.
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()>;

    /// Removes a record.
    fn remove(&mut self, key: &str) -> crate::Result<()>;

    /// Human-readable location, shown by `doccie auth status`.
    fn location(&self) -> String;
}

/// In-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: HashMap<String, String>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        self.records.remove(key);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Stores each record as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn storage_error(action: &str, path: &Path, err: &std::io::Error) -> DoccieError {
    DoccieError::Storage {
        message: format!("Failed to {action} {}: {err}", path.display()),
    }
}

impl SessionBackend for FileBackend {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, &e)),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display()))]
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_error("create", &self.dir, &e))?;

        let path = self.record_path(key);

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value).map_err(|e| storage_error("write", &temp_path, &e))?;

        // Records hold a bearer token; keep them private to the user
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, perms)
                .map_err(|e| storage_error("set permissions on", &temp_path, &e))?;
        }

        fs::rename(&temp_path, &path).map_err(|e| storage_error("rename", &path, &e))?;
        debug!(key, "Session record written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "Session record removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, &e)),
        }
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Stores each record as a system keyring entry under [`KEYRING_SERVICE`].
#[cfg(feature = "keyring")]
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringBackend;

#[cfg(feature = "keyring")]
impl KeyringBackend {
    fn entry(key: &str) -> crate::Result<keyring::Entry> {
        Ok(keyring::Entry::new(KEYRING_SERVICE, key)?)
    }
}

#[cfg(feature = "keyring")]
impl SessionBackend for KeyringBackend {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        Self::entry(key)?.set_password(value)?;
        debug!(key, "Session record stored in keyring");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        "system keyring".to_string()
    }
}
