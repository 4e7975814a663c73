//! Periodic regeneration of the one-time authentication seed.
//!
//! A [`Scheduler`] ticks on a fixed interval and hands each tick to a
//! [`Regenerator`], which pulls the newest lava lamp image, optionally
//! transforms and uploads it, derives a seed and makes it the single
//! served code. Every failure is local to its cycle; the next tick simply
//! tries again.
//!
//! The on-demand password path shares the same collaborators and lives in
//! [`PasswordGenerator`].

mod cycle;
mod oneshot;
mod scheduler;
mod stats;
#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{CycleError, CycleReport, Degradation, Regenerator};
pub use oneshot::{GeneratedPassword, OneShotError, PasswordGenerator};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use stats::CycleStats;

use crate::config::FileConfig;
use std::time::Duration;

/// Per-cycle settings of a [`Regenerator`].
#[derive(Debug, Clone)]
pub struct RegenerationSettings {
    /// Lifetime of each issued code.
    pub code_ttl: Duration,
    /// Prefix for keys of uploaded transformed images.
    pub output_prefix: String,
}

impl Default for RegenerationSettings {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(60),
            output_prefix: "wallpaper_".to_string(),
        }
    }
}

impl From<&FileConfig> for RegenerationSettings {
    fn from(config: &FileConfig) -> Self {
        Self {
            code_ttl: config.schedule.code_ttl(),
            output_prefix: config.output.prefix.clone(),
        }
    }
}
