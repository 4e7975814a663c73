//! Running totals of regeneration cycle outcomes.

use super::{CycleError, CycleReport, Degradation};
use chrono::{DateTime, Utc};

/// Counters describing how regeneration cycles have gone so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Cycles attempted.
    pub cycles_total: u64,
    /// Cycles that issued a new code.
    pub cycles_succeeded: u64,
    /// Cycles aborted because no source image could be obtained.
    pub source_unavailable: u64,
    /// Cycles aborted because the new code could not be stored.
    pub persist_failures: u64,
    /// Transform failures that fell back to the original image.
    pub transform_failures: u64,
    /// Upload failures that fell back to the original image.
    pub upload_failures: u64,
    /// Cleanups that left superseded codes behind.
    pub cleanup_failures: u64,
    /// Ticks dropped because a cycle was still running.
    pub skipped_ticks: u64,
    /// Aborted cycles since the last success.
    pub consecutive_failures: u64,
    /// Issue time of the most recent code.
    pub last_success: Option<DateTime<Utc>>,
    /// Entropy estimate of the most recent code.
    pub last_entropy_bits: Option<u32>,
}

impl CycleStats {
    pub(crate) fn record_success(&mut self, report: &CycleReport) {
        self.cycles_total += 1;
        self.cycles_succeeded += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(report.code.created_at);
        self.last_entropy_bits = Some(report.entropy_bits);

        for degradation in &report.degradations {
            match degradation {
                Degradation::TransformFailed(_) => self.transform_failures += 1,
                Degradation::UploadFailed(_) => self.upload_failures += 1,
                Degradation::CleanupFailed(_) => self.cleanup_failures += 1,
            }
        }
    }

    pub(crate) fn record_failure(&mut self, error: &CycleError) {
        self.cycles_total += 1;
        self.consecutive_failures += 1;

        match error {
            CycleError::SourceUnavailable(_) => self.source_unavailable += 1,
            CycleError::Persist(_) => self.persist_failures += 1,
        }
    }
}
