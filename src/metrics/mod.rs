//! Prometheus metrics for seed regeneration.
//!
//! # Metrics Exposed
//!
//! ## Cycle Outcomes
//! - `lava_seed_cycles_total` - Regeneration cycles attempted
//! - `lava_seed_cycles_succeeded_total` - Cycles that issued a new code
//! - `lava_seed_source_unavailable_total` - Cycles aborted for lack of a source image
//! - `lava_seed_persist_failures_total` - Cycles aborted by a store write failure
//!
//! ## Degradations
//! - `lava_seed_transform_failures_total` - Transform fallbacks
//! - `lava_seed_upload_failures_total` - Upload fallbacks
//! - `lava_seed_cleanup_failures_total` - Cleanups leaving superseded codes
//!
//! ## Scheduling
//! - `lava_seed_skipped_ticks_total` - Ticks skipped while a cycle was running
//! - `lava_seed_consecutive_failures` - Aborted cycles since the last success
//! - `lava_seed_last_success_timestamp_seconds` - Issue time of the current code
//! - `lava_seed_last_entropy_bits` - Entropy estimate of the current code
//!
//! With the `server` feature the registry is served over HTTP together
//! with the current code (`GET /mfa`) and on-demand passwords
//! (`POST /password?length=N`).

mod collector;
#[cfg(feature = "server")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "server")]
pub use server::{HttpServer, HttpServerConfig, ServerError};
