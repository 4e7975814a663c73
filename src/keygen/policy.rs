//! Caller-facing length policy for one-shot passwords.
//!
//! The derivation engine accepts any positive length. Requests coming from
//! users go through this policy first so that generated passwords stay in
//! a sensible range.

use serde::{Deserialize, Serialize};

/// Length range and fallback applied to user-requested passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthPolicy {
    /// Shortest length honoured as requested.
    pub min: usize,
    /// Requests above this are clamped down to it.
    pub max: usize,
    /// Used when the request is absent or below `min`.
    pub fallback: usize,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            min: 8,
            max: 32,
            fallback: 20,
        }
    }
}

impl LengthPolicy {
    /// Resolves a requested length into the length actually generated.
    ///
    /// Requests below `min` (including zero and negatives) use `fallback`
    /// rather than `min`.
    pub fn resolve(&self, requested: Option<i64>) -> usize {
        let requested = match requested {
            Some(n) => n,
            None => return self.fallback,
        };

        if requested < self.min as i64 {
            self.fallback
        } else if requested > self.max as i64 {
            self.max
        } else {
            requested as usize
        }
    }
}
