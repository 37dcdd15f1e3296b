// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Local credential store.
//!
//! Holds the opaque session token and the user name. Its presence is the only
//! "authenticated" signal the session monitor looks at.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::locks::{resilient_read, resilient_write};
use crate::utils::mask_sensitive;

const SESSION_FILE: &str = "session.json";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user_name: Option<String>) -> Self {
        Self { token: token.into(), user_name }
    }
}

// Never print the token, not even in debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &mask_sensitive(&self.token, 6))
            .field("user_name", &self.user_name)
            .finish()
    }
}

/// Where the session token lives between commands.
pub trait CredentialStore: Send + Sync {
    fn save(&self, credentials: &Credentials) -> io::Result<()>;

    /// `None` when nothing is stored or the stored data is unreadable.
    fn load(&self) -> Option<Credentials>;

    /// Remove stored credentials. Infallible: failures are logged.
    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.load().is_some_and(|c| !c.token.is_empty())
    }

    fn user_name(&self) -> Option<String> {
        self.load().and_then(|c| c.user_name)
    }
}

/// Process-local store, used by tests and by callers that never persist.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self { inner: RwLock::new(Some(credentials)) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credentials: &Credentials) -> io::Result<()> {
        *resilient_write(&self.inner) = Some(credentials.clone());
        Ok(())
    }

    fn load(&self) -> Option<Credentials> {
        resilient_read(&self.inner).clone()
    }

    fn clear(&self) {
        *resilient_write(&self.inner) = None;
    }
}

/// JSON file store at `~/.optrack/session.json`, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default config directory.
    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::config_dir()?.join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn write_private(&self, content: &str) -> io::Result<()> {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        // mode() only applies on creation; tighten an existing file too.
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(content.as_bytes())
    }

    #[cfg(not(unix))]
    fn write_private(&self, content: &str) -> io::Result<()> {
        fs::write(&self.path, content)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credentials: &Credentials) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credentials)?;
        self.write_private(&content)?;
        tracing::debug!(
            "CREDENTIALS_SAVED | user={} token={}",
            credentials.user_name.as_deref().unwrap_or("-"),
            mask_sensitive(&credentials.token, 6)
        );
        Ok(())
    }

    fn load(&self) -> Option<Credentials> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("CREDENTIALS_CLEARED | path={}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert!(!store.is_authenticated());
        store.save(&Credentials::new("tok", Some("ana".into()))).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.user_name().as_deref(), Some("ana"));
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let store = MemoryCredentialStore::with_credentials(Credentials::new("", None));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().is_none());

        let creds = Credentials::new("eyJhbGciOi.token", Some("luis".into()));
        store.save(&creds).unwrap();
        assert_eq!(store.load(), Some(creds));

        store.clear();
        assert!(!store.path().exists());
        // Clearing twice is fine.
        store.clear();
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{{{").unwrap();
        let store = FileCredentialStore::new(&path);
        assert!(store.load().is_none());
        assert!(!store.is_authenticated());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("session.json"));
        store.save(&Credentials::new("tok", None)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_debug_masks_token() {
        let creds = Credentials::new("supersecrettoken", Some("ana".into()));
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("supersecrettoken"));
        assert!(debug.contains("supers..."));
    }
}
