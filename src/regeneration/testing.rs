//! In-memory collaborators for regeneration tests.

use crate::source::{
    Collector, CollectorError, ObjectKey, OutputError, OutputStore, TransformError,
    TransformService,
};
use crate::store::{AuthCode, MemoryStore, RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Collector serving one fixed image.
pub struct FixedCollector {
    image: Option<(ObjectKey, Vec<u8>)>,
    broken_download: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FixedCollector {
    pub fn new(key: &str, bytes: &[u8]) -> Self {
        Self {
            image: Some((ObjectKey::new(key), bytes.to_vec())),
            broken_download: false,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            image: None,
            ..Self::new("", b"")
        }
    }

    pub fn broken_download(key: &str) -> Self {
        Self {
            broken_download: true,
            ..Self::new(key, b"")
        }
    }

    /// Makes every fetch take `delay` of (tokio) time.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Collector for FixedCollector {
    async fn latest(&self) -> Result<ObjectKey, CollectorError> {
        self.image
            .as_ref()
            .map(|(key, _)| key.clone())
            .ok_or(CollectorError::NotFound)
    }

    async fn fetch(&self, key: &ObjectKey) -> Result<Vec<u8>, CollectorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.broken_download {
            return Err(CollectorError::DownloadFailed {
                key: key.clone(),
                reason: "connection reset".into(),
            });
        }
        match &self.image {
            Some((stored, bytes)) if stored == key => Ok(bytes.clone()),
            _ => Err(CollectorError::MissingObject(key.clone())),
        }
    }
}

/// Transform that reverses the image bytes.
pub struct ReversingTransform;

#[async_trait]
impl TransformService for ReversingTransform {
    async fn transform(&self, image: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(image.iter().rev().copied().collect())
    }
}

/// Transform that always fails.
pub struct FailingTransform;

#[async_trait]
impl TransformService for FailingTransform {
    async fn transform(&self, _image: &[u8]) -> Result<Vec<u8>, TransformError> {
        Err(TransformError::Unavailable("model offline".into()))
    }
}

/// Output store remembering the keys it was given.
#[derive(Default)]
pub struct MemoryOutput {
    keys: Mutex<Vec<ObjectKey>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputStore for MemoryOutput {
    async fn store(&self, key: &ObjectKey, _data: &[u8]) -> Result<ObjectKey, OutputError> {
        self.keys.lock().unwrap().push(key.clone());
        Ok(key.clone())
    }
}

/// Output store that always fails.
pub struct FailingOutput;

#[async_trait]
impl OutputStore for FailingOutput {
    async fn store(&self, key: &ObjectKey, _data: &[u8]) -> Result<ObjectKey, OutputError> {
        Err(OutputError::WriteFailed {
            key: key.clone(),
            reason: "bucket unavailable".into(),
        })
    }
}

/// Record store counting calls, with switchable failures.
///
/// Uses the default create-then-delete `replace`.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub creates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn create(&self, code: &AuthCode) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }
        self.inner.create(code).await
    }

    async fn current(&self, now: DateTime<Utc>) -> Result<Option<AuthCode>, StoreError> {
        self.inner.current(now).await
    }

    async fn delete_except(&self, keep: Uuid) -> Result<usize, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete timed out".into()));
        }
        self.inner.delete_except(keep).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}
