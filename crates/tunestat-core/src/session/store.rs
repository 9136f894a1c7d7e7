//! Fallback credential storage.
//!
//! Persists one token per origin in `<home>/local_storage.json` with
//! restricted permissions (0600). Stored tokens have no expiry and are
//! trusted on read. Storage failures never propagate: a failed read is an
//! absent credential and a failed write is logged and dropped.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::FallbackCredential;
use crate::config::{Config, paths};

/// Key under which the token is stored inside an origin's section.
pub const STORAGE_KEY: &str = "spotify_token";

/// Synchronous, origin-scoped credential storage.
pub trait TokenFallbackStore {
    fn read(&self) -> Option<FallbackCredential>;
    fn write(&self, token: &str);
    fn clear(&self);
}

impl<T: TokenFallbackStore + ?Sized> TokenFallbackStore for Box<T> {
    fn read(&self) -> Option<FallbackCredential> {
        (**self).read()
    }

    fn write(&self, token: &str) {
        (**self).write(token);
    }

    fn clear(&self) {
        (**self).clear();
    }
}

/// File layout: origin -> key -> value.
type StorageFile = BTreeMap<String, BTreeMap<String, String>>;

/// File-backed store scoped to a single origin.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    origin: String,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>, origin: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            origin: origin.into(),
        }
    }

    /// Opens the default storage file, scoped to the configured backend origin.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            paths::local_storage_path(),
            config.storage_origin()?,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StorageFile> {
        if !self.path.exists() {
            return Ok(StorageFile::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(StorageFile::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, file: &StorageFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(file).context("Failed to serialize local storage")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut handle = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            handle
                .write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    fn update(&self, token: Option<&str>) -> Result<()> {
        // An unreadable file is replaced rather than blocking the write.
        let mut file = self.load().unwrap_or_default();
        match token {
            Some(token) => {
                file.entry(self.origin.clone())
                    .or_default()
                    .insert(STORAGE_KEY.to_string(), token.to_string());
            }
            None => {
                if let Some(section) = file.get_mut(&self.origin) {
                    section.remove(STORAGE_KEY);
                    if section.is_empty() {
                        file.remove(&self.origin);
                    }
                }
            }
        }
        self.save(&file)
    }
}

impl TokenFallbackStore for LocalStorage {
    fn read(&self) -> Option<FallbackCredential> {
        match self.load() {
            Ok(file) => file
                .get(&self.origin)
                .and_then(|section| section.get(STORAGE_KEY))
                .filter(|token| !token.trim().is_empty())
                .map(FallbackCredential::new),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "fallback store unreadable; treating as empty");
                None
            }
        }
    }

    fn write(&self, token: &str) {
        if let Err(err) = self.update(Some(token)) {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist fallback credential");
        }
    }

    fn clear(&self) {
        if let Err(err) = self.update(None) {
            tracing::warn!(error = %format!("{err:#}"), "failed to clear fallback credential");
        }
    }
}

/// In-process store, used for `--ephemeral` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryFallbackStore {
    token: Mutex<Option<String>>,
}

impl MemoryFallbackStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenFallbackStore for MemoryFallbackStore {
    fn read(&self) -> Option<FallbackCredential> {
        let guard = self.token.lock().ok()?;
        guard
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(FallbackCredential::new)
    }

    fn write(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path().join("local_storage.json"), "http://a");
        assert_eq!(store.read(), None);
    }

    #[test]
    fn write_then_read_same_origin() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path().join("local_storage.json"), "http://a");
        store.write("xyz");
        assert_eq!(store.read(), Some(FallbackCredential::new("xyz")));

        store.write("newer");
        assert_eq!(store.read(), Some(FallbackCredential::new("newer")));
    }

    #[test]
    fn origins_are_isolated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let a = LocalStorage::new(&path, "http://a");
        let b = LocalStorage::new(&path, "http://b");

        a.write("token-a");
        assert_eq!(b.read(), None);

        b.write("token-b");
        assert_eq!(a.read(), Some(FallbackCredential::new("token-a")));

        a.clear();
        assert_eq!(a.read(), None);
        assert_eq!(b.read(), Some(FallbackCredential::new("token-b")));
    }

    #[test]
    fn corrupt_file_reads_as_absent_and_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "{not json").unwrap();
        let store = LocalStorage::new(&path, "http://a");

        assert_eq!(store.read(), None);
        store.write("fresh");
        assert_eq!(store.read(), Some(FallbackCredential::new("fresh")));
    }

    #[test]
    fn empty_value_reads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, r#"{"http://a": {"spotify_token": ""}}"#).unwrap();
        assert_eq!(LocalStorage::new(&path, "http://a").read(), None);
    }

    #[test]
    fn unwritable_location_does_not_panic() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        // Parent is a regular file, so directory creation fails.
        let store = LocalStorage::new(blocker.join("local_storage.json"), "http://a");
        store.write("xyz");
        assert_eq!(store.read(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path().join("local_storage.json"), "http://a");
        store.write("xyz");
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryFallbackStore::default();
        assert_eq!(store.read(), None);
        store.write("abc");
        assert_eq!(store.read(), Some(FallbackCredential::new("abc")));
        store.clear();
        assert_eq!(store.read(), None);
    }
}
