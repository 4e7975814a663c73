//! Authentication code persistence.
//!
//! The record store is the only shared mutable state touched by the
//! regeneration loop. Readers must tolerate zero, one or, for stores
//! without an atomic `replace`, briefly two valid records; they always
//! pick the most recently created unexpired one.

mod memory;
mod record;

pub use memory::MemoryStore;
pub use record::{AuthCode, CurrentCode};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record {0} already exists")]
    Duplicate(Uuid),
}

/// Failure of a [`RecordStore::replace`], split by the step that failed.
#[derive(Debug, Error)]
pub enum ReplaceError {
    /// The new record was not written; nothing changed.
    #[error("failed to persist auth code: {0}")]
    Persist(#[source] StoreError),
    /// The new record was written but superseded ones remain.
    #[error("failed to remove superseded auth codes: {0}")]
    Cleanup(#[source] StoreError),
}

/// Trait for authentication code stores.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record.
    async fn create(&self, code: &AuthCode) -> Result<(), StoreError>;

    /// Returns the most recently created record with `expires_at > now`.
    async fn current(&self, now: DateTime<Utc>) -> Result<Option<AuthCode>, StoreError>;

    /// Deletes every record except `keep`, expired or not.
    /// Returns the number of records removed.
    async fn delete_except(&self, keep: Uuid) -> Result<usize, StoreError>;

    /// Returns the number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Makes `code` the only stored record and returns how many were removed.
    ///
    /// The default creates first and deletes afterwards; if the delete
    /// fails the new record stays and the old ones linger until the next
    /// replace. Stores that can swap atomically should override this.
    async fn replace(&self, code: &AuthCode) -> Result<usize, ReplaceError> {
        self.create(code).await.map_err(ReplaceError::Persist)?;
        self.delete_except(code.id)
            .await
            .map_err(ReplaceError::Cleanup)
    }
}

/// Returns the code currently served, or `None` when no unexpired code
/// exists.
pub async fn current_code<S>(store: &S, now: DateTime<Utc>) -> Result<Option<CurrentCode>, StoreError>
where
    S: RecordStore + ?Sized,
{
    Ok(store.current(now).await?.map(CurrentCode::from))
}
