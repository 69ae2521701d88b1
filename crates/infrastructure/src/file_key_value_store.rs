//! Key-value store persisted as a JSON object in a local file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fundgate_application::KeyValueStore;
use fundgate_core::{AppError, AppResult};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// File implementation of the key-value store port.
///
/// Every write goes to its own uniquely named sibling file that is then
/// renamed over the target, so readers and writers in other processes never
/// see a partial document.
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn read_document(&self) -> AppResult<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read store file '{}': {error}",
                    self.path.display()
                )));
            }
        };

        Ok(serde_json::from_str(contents.as_str()).unwrap_or_else(|error| {
            warn!(
                path = %self.path.display(),
                error = %error,
                "store file is not a JSON object of strings, treating it as empty"
            );
            BTreeMap::new()
        }))
    }

    async fn write_document(&self, document: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create store directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let encoded = serde_json::to_string_pretty(document)
            .map_err(|error| AppError::Internal(format!("failed to encode store file: {error}")))?;
        let temporary_path = self.temporary_path();
        if let Err(error) = tokio::fs::write(&temporary_path, encoded).await {
            let _ = tokio::fs::remove_file(&temporary_path).await;
            return Err(AppError::Internal(format!(
                "failed to write store file '{}': {error}",
                temporary_path.display()
            )));
        }

        if let Err(error) = tokio::fs::rename(&temporary_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temporary_path).await;
            return Err(AppError::Internal(format!(
                "failed to replace store file '{}': {error}",
                self.path.display()
            )));
        }

        Ok(())
    }

    fn temporary_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "store".into(), |name| name.to_string_lossy());
        self.path
            .with_file_name(format!("{file_name}.{}.tmp", Uuid::new_v4()))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _write = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_owned(), value.to_owned());
        self.write_document(&document).await
    }
}
