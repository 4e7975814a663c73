//! Storage for transformed images.

use super::ObjectKey;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while storing transformed images.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("invalid output key: {0}")]
    InvalidKey(ObjectKey),
    #[error("failed to store {key}: {reason}")]
    WriteFailed { key: ObjectKey, reason: String },
}

/// Trait for output stores holding transformed images.
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Stores `data` under `key` and returns the confirmed key.
    async fn store(&self, key: &ObjectKey, data: &[u8]) -> Result<ObjectKey, OutputError>;
}

/// Output store writing images into a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryOutputStore {
    root: PathBuf,
}

impl DirectoryOutputStore {
    /// Creates a store writing into `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl OutputStore for DirectoryOutputStore {
    async fn store(&self, key: &ObjectKey, data: &[u8]) -> Result<ObjectKey, OutputError> {
        if !key.is_plain() {
            return Err(OutputError::InvalidKey(key.clone()));
        }

        let write_failed = |e: std::io::Error| OutputError::WriteFailed {
            key: key.clone(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(write_failed)?;
        tokio::fs::write(self.root.join(key.as_str()), data)
            .await
            .map_err(write_failed)?;

        tracing::debug!(key = %key, bytes = data.len(), "Stored transformed image");
        Ok(key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryOutputStore::new(dir.path().join("out"));

        let key = ObjectKey::new("wallpaper_1.jpg");
        let confirmed = store.store(&key, b"image").await.unwrap();

        assert_eq!(confirmed, key);
        let written = std::fs::read(dir.path().join("out/wallpaper_1.jpg")).unwrap();
        assert_eq!(written, b"image");
    }

    #[tokio::test]
    async fn test_store_rejects_nested_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryOutputStore::new(dir.path());

        assert!(matches!(
            store.store(&ObjectKey::new("a/b.jpg"), b"x").await,
            Err(OutputError::InvalidKey(_))
        ));
    }
}
