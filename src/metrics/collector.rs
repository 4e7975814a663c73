//! Metrics collection and registry.

use crate::regeneration::CycleStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of regeneration state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Cycles attempted.
    pub cycles_total: u64,
    /// Cycles that issued a code.
    pub cycles_succeeded: u64,
    /// Cycles aborted for lack of a source image.
    pub source_unavailable: u64,
    /// Cycles aborted by a store write failure.
    pub persist_failures: u64,
    /// Transform fallbacks.
    pub transform_failures: u64,
    /// Upload fallbacks.
    pub upload_failures: u64,
    /// Cleanup failures.
    pub cleanup_failures: u64,
    /// Ticks skipped while a cycle was running.
    pub skipped_ticks: u64,
    /// Aborted cycles since the last success.
    pub consecutive_failures: u64,
    /// Unix time of the last issued code.
    pub last_success_unix: Option<i64>,
    /// Entropy estimate of the last issued code.
    pub last_entropy_bits: Option<u32>,
}

impl MetricsSnapshot {
    /// Creates a snapshot from regeneration statistics.
    pub fn from_stats(stats: &CycleStats) -> Self {
        Self {
            cycles_total: stats.cycles_total,
            cycles_succeeded: stats.cycles_succeeded,
            source_unavailable: stats.source_unavailable,
            persist_failures: stats.persist_failures,
            transform_failures: stats.transform_failures,
            upload_failures: stats.upload_failures,
            cleanup_failures: stats.cleanup_failures,
            skipped_ticks: stats.skipped_ticks,
            consecutive_failures: stats.consecutive_failures,
            last_success_unix: stats.last_success.map(|t| t.timestamp()),
            last_entropy_bits: stats.last_entropy_bits,
        }
    }
}

/// Prometheus metrics registry for seed regeneration.
pub struct MetricsRegistry {
    registry: Registry,

    // Cycle outcomes
    cycles_total: IntCounter,
    cycles_succeeded: IntCounter,
    source_unavailable: IntCounter,
    persist_failures: IntCounter,

    // Degradations
    transform_failures: IntCounter,
    upload_failures: IntCounter,
    cleanup_failures: IntCounter,

    // Scheduling
    skipped_ticks: IntCounter,
    consecutive_failures: IntGauge,

    // Latest code
    last_success: IntGauge,
    last_entropy_bits: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all regeneration metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new(
            "lava_seed_cycles_total",
            "Total number of regeneration cycles attempted",
        )?;
        let cycles_succeeded = IntCounter::new(
            "lava_seed_cycles_succeeded_total",
            "Regeneration cycles that issued a new code",
        )?;
        let source_unavailable = IntCounter::new(
            "lava_seed_source_unavailable_total",
            "Cycles aborted because no source image was available",
        )?;
        let persist_failures = IntCounter::new(
            "lava_seed_persist_failures_total",
            "Cycles aborted because the new code could not be stored",
        )?;

        let transform_failures = IntCounter::new(
            "lava_seed_transform_failures_total",
            "Transform failures that fell back to the original image",
        )?;
        let upload_failures = IntCounter::new(
            "lava_seed_upload_failures_total",
            "Upload failures that fell back to the original image",
        )?;
        let cleanup_failures = IntCounter::new(
            "lava_seed_cleanup_failures_total",
            "Cleanups that left superseded codes behind",
        )?;

        let skipped_ticks = IntCounter::new(
            "lava_seed_skipped_ticks_total",
            "Ticks skipped because a cycle was still running",
        )?;
        let consecutive_failures = IntGauge::new(
            "lava_seed_consecutive_failures",
            "Aborted cycles since the last successful one",
        )?;

        let last_success = IntGauge::new(
            "lava_seed_last_success_timestamp_seconds",
            "Unix time the current code was issued (0 if none yet)",
        )?;
        let last_entropy_bits = IntGauge::new(
            "lava_seed_last_entropy_bits",
            "Entropy estimate of the current code in bits",
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_succeeded.clone()))?;
        registry.register(Box::new(source_unavailable.clone()))?;
        registry.register(Box::new(persist_failures.clone()))?;
        registry.register(Box::new(transform_failures.clone()))?;
        registry.register(Box::new(upload_failures.clone()))?;
        registry.register(Box::new(cleanup_failures.clone()))?;
        registry.register(Box::new(skipped_ticks.clone()))?;
        registry.register(Box::new(consecutive_failures.clone()))?;
        registry.register(Box::new(last_success.clone()))?;
        registry.register(Box::new(last_entropy_bits.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_succeeded,
            source_unavailable,
            persist_failures,
            transform_failures,
            upload_failures,
            cleanup_failures,
            skipped_ticks,
            consecutive_failures,
            last_success,
            last_entropy_bits,
        })
    }

    /// Updates all metrics from a snapshot of regeneration state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, so add the difference.
        advance(&self.cycles_total, snapshot.cycles_total);
        advance(&self.cycles_succeeded, snapshot.cycles_succeeded);
        advance(&self.source_unavailable, snapshot.source_unavailable);
        advance(&self.persist_failures, snapshot.persist_failures);
        advance(&self.transform_failures, snapshot.transform_failures);
        advance(&self.upload_failures, snapshot.upload_failures);
        advance(&self.cleanup_failures, snapshot.cleanup_failures);
        advance(&self.skipped_ticks, snapshot.skipped_ticks);

        self.consecutive_failures
            .set(snapshot.consecutive_failures as i64);

        if let Some(at) = snapshot.last_success_unix {
            self.last_success.set(at);
        }
        if let Some(bits) = snapshot.last_entropy_bits {
            self.last_entropy_bits.set(bits as i64);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
