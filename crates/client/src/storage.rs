//! File-backed key-value store for anonymous client state.
//!
//! Mirrors a browser's `localStorage`: string keys mapped to string values,
//! persisted as one JSON object. Writes go to a temporary sibling file that
//! is then renamed over the original, so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ClientError;

/// Environment variable overriding the storage file location.
pub const LOCAL_STORAGE_ENV: &str = "NIMBUS_LOCAL_STORAGE";

type Entries = BTreeMap<String, String>;

/// Persistent string map stored at a single path.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    /// Held from load to save by every operation on this handle.
    lock: Mutex<()>,
}

impl LocalStorage {
    /// Open (lazily) the store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the store at [`default_path`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if no data directory can be found.
    pub fn open_default() -> Result<Self, ClientError> {
        Ok(Self::new(default_path()?))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        Ok(entries.remove(key))
    }

    /// Read, transform and write back the value under `key` as one step.
    ///
    /// `f` receives the current value and returns the new one (`None`
    /// deletes the key) along with a result for the caller. The file is
    /// rewritten only when the value changes. No other call on this handle
    /// runs between the read and the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or whatever
    /// error `f` returns. Nothing is written when `f` fails.
    pub async fn update<T, F>(&self, key: &str, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(Option<String>) -> Result<(Option<String>, T), ClientError> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let current = entries.get(key).cloned();
        let (next, out) = f(current.clone())?;

        if next != current {
            match next {
                Some(value) => entries.insert(key.to_string(), value),
                None => entries.remove(key),
            };
            self.save(&entries).await?;
        }
        Ok(out)
    }

    async fn load(&self) -> Result<Entries, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), keys = entries.len(), "Local storage saved");
        Ok(())
    }
}

/// Storage file location: `$NIMBUS_LOCAL_STORAGE`, else
/// `<data dir>/nimbus/local_storage.json`.
///
/// # Errors
///
/// Returns `ClientError::Validation` if the override is unset and the
/// platform has no data directory.
pub fn default_path() -> Result<PathBuf, ClientError> {
    if let Some(path) = std::env::var_os(LOCAL_STORAGE_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::data_dir()
        .map(|dir| dir.join("nimbus").join("local_storage.json"))
        .ok_or_else(|| {
            ClientError::Validation(format!(
                "no data directory found; set {LOCAL_STORAGE_ENV}"
            ))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get_item("weatherFavorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_sets_replaces_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let storage = LocalStorage::new(&path);

        storage
            .update("a", |_| Ok((Some("1".to_owned()), ())))
            .await
            .unwrap();
        storage
            .update("b", |_| Ok((Some("2".to_owned()), ())))
            .await
            .unwrap();
        let previous = storage
            .update("a", |old| Ok((Some("3".to_owned()), old)))
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(storage.get_item("a").await.unwrap().as_deref(), Some("3"));

        // A fresh handle sees the persisted values.
        let reopened = LocalStorage::new(&path);
        assert_eq!(reopened.path(), path);
        assert_eq!(reopened.get_item("b").await.unwrap().as_deref(), Some("2"));

        reopened.update("a", |_| Ok((None, ()))).await.unwrap();
        reopened.update("missing", |_| Ok((None, ()))).await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap(), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let storage = LocalStorage::new(&path);

        let result: Result<(), _> = storage
            .update("a", |_| Err(ClientError::Validation("rejected".to_owned())))
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(LocalStorage::new(dir.path().join("store.json")));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let storage = std::sync::Arc::clone(&storage);
                tokio::spawn(async move {
                    storage
                        .update("count", |old| {
                            let n: u32 = old.map_or(0, |v| v.parse().unwrap());
                            Ok((Some((n + 1).to_string()), ()))
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            storage.get_item("count").await.unwrap().as_deref(),
            Some("20")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = LocalStorage::new(&path);
        assert!(matches!(
            storage.get_item("a").await,
            Err(ClientError::Serde(_))
        ));
    }
}
