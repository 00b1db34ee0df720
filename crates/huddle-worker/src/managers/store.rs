//! Persisted string-keyed settings store.
//!
//! A flat TOML document on disk. Collaborators treat it as an opaque
//! key/value map; the well-known keys live here as constants.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{WorkerError, WorkerResult};

/// Wire integer of the last observed meeting status.
pub const LAST_MEETING_STATUS_KEY: &str = "last_meeting_status";
/// RFC 3339 timestamp of the last abnormal IPC close.
pub const LAST_EXCEPTION_AT_KEY: &str = "last_exception_at";
/// How the cached credentials were obtained ("token" for now).
pub const CACHED_LOGIN_KIND_KEY: &str = "cached_login_kind";
/// Cached account id for re-login.
pub const CACHED_LOGIN_ACCOUNT_KEY: &str = "cached_login_account";
/// Cached account token for re-login.
pub const CACHED_LOGIN_TOKEN_KEY: &str = "cached_login_token";

/// String-keyed store backed by a TOML file.
///
/// Mutations stay in memory until [`ConfigStore::save`]. A store without a
/// path (see [`ConfigStore::in_memory`]) accepts mutations and saves to
/// nowhere, which is what tests and config-dir-less environments want.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Opens the store at `path`, starting empty when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> WorkerResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            toml::from_str(&text).map_err(|error| {
                WorkerError::config(format!("parse {}: {}", path.display(), error))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Opens the store at the platform default location.
    ///
    /// Falls back to an in-memory store when the platform has no config
    /// directory.
    pub fn open_default() -> WorkerResult<Self> {
        match Self::default_path() {
            Some(path) => Self::open(path),
            None => {
                warn!("no platform config directory, settings will not persist");
                Ok(Self::in_memory())
            }
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: BTreeMap::new(),
        }
    }

    /// The platform default store location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("huddle").join("worker.toml"))
    }

    /// The backing file, when there is one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Writes a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes a value, returning the previous one.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Caches credentials for the next login.
    pub fn set_cached_login(&mut self, account_id: &str, token: &str) {
        self.set(CACHED_LOGIN_KIND_KEY, "token");
        self.set(CACHED_LOGIN_ACCOUNT_KEY, account_id);
        self.set(CACHED_LOGIN_TOKEN_KEY, token);
    }

    /// Drops the cached credential keys.
    pub fn clear_cached_login(&mut self) {
        self.values.remove(CACHED_LOGIN_KIND_KEY);
        self.values.remove(CACHED_LOGIN_ACCOUNT_KEY);
        self.values.remove(CACHED_LOGIN_TOKEN_KEY);
    }

    /// Writes the store to disk; a pathless store saves to nowhere.
    pub fn save(&self) -> WorkerResult<()> {
        let Some(ref path) = self.path else {
            debug!("in-memory settings store, skipping save");
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string(&self.values).map_err(|error| {
            WorkerError::config(format!("serialize {}: {}", path.display(), error))
        })?;
        std::fs::write(path, text)?;
        debug!(path = %path.display(), keys = self.values.len(), "settings saved");
        Ok(())
    }
}
