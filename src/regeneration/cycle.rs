//! A single regeneration cycle.
//!
//! Each cycle walks the same fixed sequence:
//!
//! ```text
//! fetch reference → download → transform → upload → derive → persist → cleanup
//!       ↓              ↓           ↓          ↓                  ↓         ↓
//!     abort          abort     fallback   fallback            abort     logged
//! ```
//!
//! Failing to obtain a source image or to store the new code aborts the
//! cycle without touching the record store. Transform and upload failures
//! only degrade the cycle: the original image and its key are used instead,
//! so the stored key always names the bytes the seed came from.

use super::{CycleStats, RegenerationSettings};
use crate::keygen;
use crate::source::{Collector, CollectorError, ObjectKey, OutputStore, TransformService};
use crate::store::{AuthCode, RecordStore, ReplaceError, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// Reasons a cycle was aborted.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(CollectorError),
    #[error("failed to persist auth code: {0}")]
    Persist(StoreError),
}

/// Non-fatal problems a cycle worked around.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Degradation {
    #[error("transform failed, using original image: {0}")]
    TransformFailed(String),
    #[error("upload failed, using original image: {0}")]
    UploadFailed(String),
    #[error("cleanup failed, superseded codes remain: {0}")]
    CleanupFailed(String),
}

/// Outcome of a cycle that issued a new code.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The code written to the store.
    pub code: AuthCode,
    /// Entropy estimate of the code's seed.
    pub entropy_bits: u32,
    /// Number of superseded codes removed.
    pub superseded: usize,
    /// Problems worked around along the way.
    pub degradations: Vec<Degradation>,
}

impl CycleReport {
    /// Returns true if the cycle hit no problems at all.
    pub fn is_clean(&self) -> bool {
        self.degradations.is_empty()
    }
}

/// Runs regeneration cycles against a set of collaborators.
pub struct Regenerator {
    collector: Arc<dyn Collector>,
    transform: Option<Arc<dyn TransformService>>,
    output: Arc<dyn OutputStore>,
    store: Arc<dyn RecordStore>,
    settings: RegenerationSettings,
    stats: CycleStats,
}

impl Regenerator {
    /// Creates a regenerator.
    ///
    /// Without a transform service the downloaded image is used directly
    /// and nothing is uploaded.
    pub fn new(
        collector: Arc<dyn Collector>,
        transform: Option<Arc<dyn TransformService>>,
        output: Arc<dyn OutputStore>,
        store: Arc<dyn RecordStore>,
        settings: RegenerationSettings,
    ) -> Self {
        Self {
            collector,
            transform,
            output,
            store,
            settings,
            stats: CycleStats::default(),
        }
    }

    /// Returns the totals accumulated so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Runs one full cycle and records its outcome.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let result = self.cycle().await;

        match &result {
            Ok(report) => {
                self.stats.record_success(report);
                tracing::info!(
                    code_id = %report.code.id,
                    source_key = %report.code.source_key,
                    expires_at = %report.code.expires_at,
                    entropy_bits = report.entropy_bits,
                    superseded = report.superseded,
                    degraded = !report.is_clean(),
                    "Issued new auth code"
                );
            }
            Err(e) => {
                self.stats.record_failure(e);
                tracing::warn!(
                    error = %e,
                    consecutive_failures = self.stats.consecutive_failures,
                    "Regeneration cycle aborted"
                );
            }
        }

        result
    }

    async fn cycle(&self) -> Result<CycleReport, CycleError> {
        let source_key = self
            .collector
            .latest()
            .await
            .map_err(CycleError::SourceUnavailable)?;
        let original = self
            .collector
            .fetch(&source_key)
            .await
            .map_err(CycleError::SourceUnavailable)?;

        tracing::debug!(key = %source_key, bytes = original.len(), "Fetched source image");

        let mut degradations = Vec::new();
        let (source_key, entropy) = self
            .refine(source_key, original, &mut degradations)
            .await;

        let seed = keygen::derive(&entropy, 0);
        let entropy_bits = keygen::entropy_estimate(&seed);
        let code = AuthCode::issue(seed, source_key, Utc::now(), self.settings.code_ttl);

        let superseded = match self.store.replace(&code).await {
            Ok(removed) => removed,
            Err(ReplaceError::Persist(e)) => return Err(CycleError::Persist(e)),
            Err(ReplaceError::Cleanup(e)) => {
                tracing::warn!(error = %e, code_id = %code.id, "Failed to remove superseded auth codes");
                degradations.push(Degradation::CleanupFailed(e.to_string()));
                0
            }
        };

        Ok(CycleReport {
            code,
            entropy_bits,
            superseded,
            degradations,
        })
    }

    /// Transforms and uploads the source image, falling back to the
    /// original on any failure. Returns the key and bytes to derive from.
    async fn refine(
        &self,
        source_key: ObjectKey,
        original: Vec<u8>,
        degradations: &mut Vec<Degradation>,
    ) -> (ObjectKey, Vec<u8>) {
        let transform = match &self.transform {
            Some(transform) => transform,
            None => return (source_key, original),
        };

        let transformed = match transform.transform(&original).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, key = %source_key, "Transform failed, using original image");
                degradations.push(Degradation::TransformFailed(e.to_string()));
                return (source_key, original);
            }
        };

        let output_key = ObjectKey::timestamped(&self.settings.output_prefix, Utc::now());
        match self.output.store(&output_key, &transformed).await {
            Ok(confirmed) => (confirmed, transformed),
            Err(e) => {
                tracing::warn!(error = %e, key = %source_key, "Upload failed, using original image");
                degradations.push(Degradation::UploadFailed(e.to_string()));
                (source_key, original)
            }
        }
    }
}
