//! Lava Seed Library
//!
//! Turns photographs of a lava lamp into reproducible secrets: on-demand
//! passwords and a periodically refreshed one-time authentication seed.
//!
//! # Architecture
//!
//! The periodic path follows an explicit data flow, driven by a clock:
//!
//! ```text
//! source (collect → transform → upload) → keygen → store
//!                     ↑                               ↓
//!               regeneration (scheduler, cycle) ← cleanup
//! ```
//!
//! # Design Principles
//!
//! - **Deterministic derivation**: a secret is a pure function of the image
//!   bytes and the requested length
//! - **Cycle-local failures**: nothing in the periodic path stops the
//!   process; the next tick retries
//! - **One served code**: each successful cycle leaves exactly one record
//! - **Consistent provenance**: a code's source key always names the bytes
//!   its seed was derived from
//!
//! # Example
//!
//! ```no_run
//! use lava_seed::{
//!     keygen,
//!     regeneration::{Regenerator, RegenerationSettings, Scheduler},
//!     source::{DirectoryCollector, DirectoryOutputStore, PassthroughTransform},
//!     store::{current_code, MemoryStore},
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() {
//! // One-shot derivation
//! let password = keygen::derive(b"raw image bytes", 20);
//! assert_eq!(keygen::entropy_estimate(&password), 122);
//!
//! // Periodic regeneration
//! let store = Arc::new(MemoryStore::new());
//! let regenerator = Regenerator::new(
//!     Arc::new(DirectoryCollector::new("images", "lava_")),
//!     Some(Arc::new(PassthroughTransform)),
//!     Arc::new(DirectoryOutputStore::new("wallpapers")),
//!     store.clone(),
//!     RegenerationSettings::default(),
//! );
//! let handle = Scheduler::new(regenerator, Duration::from_secs(30)).spawn();
//!
//! tokio::time::sleep(Duration::from_secs(1)).await;
//! let code = current_code(store.as_ref(), chrono::Utc::now()).await.unwrap();
//! println!("{:?}", code.map(|c| c.expires_at));
//!
//! handle.stop().await.unwrap();
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod keygen;
pub mod metrics;
pub mod regeneration;
pub mod source;
pub mod store;

// Re-export commonly used types at crate root
pub use config::FileConfig;
pub use keygen::{derive, entropy_estimate, LengthPolicy};
pub use regeneration::{
    CycleReport, CycleStats, PasswordGenerator, RegenerationSettings, Regenerator, Scheduler,
};
pub use source::{Collector, ObjectKey, OutputStore, TransformService};
pub use store::{current_code, AuthCode, CurrentCode, MemoryStore, RecordStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
