//! Key derivation from photographic entropy.
//!
//! Expands the SHA-256 digest of a source image into a password-like
//! string over a fixed 74-symbol alphabet, and estimates its entropy.
//! Everything here is pure computation with no shared state, so it can be
//! called from the periodic path and one-shot requests at the same time.

mod derive;
mod policy;

pub use derive::{derive, entropy_estimate, ALPHABET, BITS_PER_CHAR, DEFAULT_LENGTH};
pub use policy::LengthPolicy;
