//! Authentication code records.

use crate::source::ObjectKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A periodically issued one-time authentication seed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCode {
    /// Record identity.
    pub id: Uuid,
    /// The derived seed served to readers.
    pub seed: String,
    /// Key of the image the seed was derived from.
    pub source_key: ObjectKey,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// The code is unreadable from this instant on.
    pub expires_at: DateTime<Utc>,
}

impl AuthCode {
    /// Issues a new code at `now` that lives for `ttl`.
    pub fn issue(
        seed: String,
        source_key: ObjectKey,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            id: Uuid::new_v4(),
            seed,
            source_key,
            created_at: now,
            expires_at,
        }
    }

    /// Returns true if the code can still be served at `now`.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

impl std::fmt::Debug for AuthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCode")
            .field("id", &self.id)
            .field("source_key", &self.source_key)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Read view of the code currently being served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCode {
    /// The seed being served.
    pub seed: String,
    /// Serialized as `valid_until`.
    #[serde(rename = "valid_until")]
    pub expires_at: DateTime<Utc>,
}

impl From<AuthCode> for CurrentCode {
    fn from(code: AuthCode) -> Self {
        Self {
            seed: code.seed,
            expires_at: code.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_issue_sets_expiry() {
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        let code = AuthCode::issue("seed".into(), "lava_1.jpg".into(), now, Duration::from_secs(60));

        assert_eq!(code.created_at, now);
        assert_eq!(code.expires_at, Utc.timestamp_opt(1_060, 0).unwrap());
        assert!(code.is_valid_at(Utc.timestamp_opt(1_059, 0).unwrap()));
        assert!(!code.is_valid_at(Utc.timestamp_opt(1_060, 0).unwrap()));
    }

    #[test]
    fn test_debug_hides_seed() {
        let code = AuthCode::issue("hunter2".into(), "lava_1.jpg".into(), Utc::now(), Duration::from_secs(60));
        assert!(!format!("{:?}", code).contains("hunter2"));
    }
}
