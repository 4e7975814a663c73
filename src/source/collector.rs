//! Entropy collector abstraction.
//!
//! The collector locates the newest raw lava lamp image and returns its
//! bytes. Hardware uploads images into a blob store; the collector only
//! reads from it.

use super::ObjectKey;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;

/// Errors that can occur while collecting source images.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("no source images found")]
    NotFound,
    #[error("source image {0} does not exist")]
    MissingObject(ObjectKey),
    #[error("invalid source key: {0}")]
    InvalidKey(ObjectKey),
    #[error("source lookup failed: {0}")]
    LookupFailed(String),
    #[error("failed to download {key}: {reason}")]
    DownloadFailed { key: ObjectKey, reason: String },
}

/// Trait for entropy collectors.
///
/// This abstraction allows swapping between a real blob store and
/// in-memory implementations for testing.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Returns the key of the most recently uploaded source image.
    async fn latest(&self) -> Result<ObjectKey, CollectorError>;

    /// Downloads the bytes stored under `key`.
    async fn fetch(&self, key: &ObjectKey) -> Result<Vec<u8>, CollectorError>;
}

/// Collector reading images from a local directory.
///
/// The newest file (by modification time) whose name starts with the
/// configured prefix is considered the latest image.
#[derive(Debug, Clone)]
pub struct DirectoryCollector {
    root: PathBuf,
    prefix: String,
}

impl DirectoryCollector {
    /// Creates a collector over `root` matching files starting with `prefix`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl Collector for DirectoryCollector {
    async fn latest(&self) -> Result<ObjectKey, CollectorError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CollectorError::LookupFailed(e.to_string()))?;

        let mut newest: Option<(SystemTime, String)> = None;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CollectorError::LookupFailed(e.to_string()))?
        {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !name.starts_with(&self.prefix) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            let candidate = (modified, name);
            if newest.as_ref().map_or(true, |current| candidate > *current) {
                newest = Some(candidate);
            }
        }

        let (_, name) = newest.ok_or(CollectorError::NotFound)?;
        tracing::debug!(key = %name, root = %self.root.display(), "Located latest source image");
        Ok(ObjectKey::new(name))
    }

    async fn fetch(&self, key: &ObjectKey) -> Result<Vec<u8>, CollectorError> {
        if !key.is_plain() {
            return Err(CollectorError::InvalidKey(key.clone()));
        }

        match tokio::fs::read(self.root.join(key.as_str())).await {
            Ok(bytes) => {
                tracing::trace!(key = %key, bytes = bytes.len(), "Downloaded source image");
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CollectorError::MissingObject(key.clone()))
            }
            Err(e) => Err(CollectorError::DownloadFailed {
                key: key.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
