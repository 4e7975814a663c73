//! In-process record store.

use super::{AuthCode, RecordStore, ReplaceError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Record store holding codes in memory.
///
/// `replace` swaps the whole record set under one write lock, so readers
/// never observe the new and the superseded code side by side.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<AuthCode>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored record, valid or not.
    pub async fn records(&self) -> Vec<AuthCode> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, code: &AuthCode) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == code.id) {
            return Err(StoreError::Duplicate(code.id));
        }
        records.push(code.clone());
        Ok(())
    }

    async fn current(&self, now: DateTime<Utc>) -> Result<Option<AuthCode>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.is_valid_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn delete_except(&self, keep: Uuid) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id == keep);
        Ok(before - records.len())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }

    async fn replace(&self, code: &AuthCode) -> Result<usize, ReplaceError> {
        let mut records = self.records.write().await;
        let removed = records.iter().filter(|r| r.id != code.id).count();
        *records = vec![code.clone()];
        Ok(removed)
    }
}
