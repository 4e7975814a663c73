//! External collaborators around the entropy source.
//!
//! This module provides trait abstractions over the blob store holding
//! raw lava lamp images, the image transform service and the store for
//! transformed images, together with local implementations. The images
//! are treated as opaque bytes; nothing here interprets pixels.

mod collector;
mod key;
mod output;
mod transform;

pub use collector::{Collector, CollectorError, DirectoryCollector};
pub use key::ObjectKey;
pub use output::{DirectoryOutputStore, OutputError, OutputStore};
pub use transform::{PassthroughTransform, TransformError, TransformService};
