//! On-demand password generation.
//!
//! Unlike the periodic path this one is strict: the caller is waiting for
//! a password, so any failed step is reported instead of worked around.

use crate::keygen::{self, LengthPolicy};
use crate::source::{
    Collector, CollectorError, ObjectKey, OutputError, OutputStore, TransformError,
    TransformService,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while generating a password on demand.
#[derive(Debug, Error)]
pub enum OneShotError {
    #[error("failed to find source image: {0}")]
    Source(#[from] CollectorError),
    #[error("image transform failed: {0}")]
    Transform(#[from] TransformError),
    #[error("failed to upload transformed image: {0}")]
    Upload(#[from] OutputError),
}

/// A freshly generated password with its provenance.
#[derive(Clone, Serialize)]
pub struct GeneratedPassword {
    /// The derived password.
    pub password: String,
    /// Entropy estimate of the password in bits.
    pub entropy_bits: u32,
    /// Key of the raw source image.
    #[serde(rename = "s3_key")]
    pub source_key: ObjectKey,
    /// Key of the transformed image the password was derived from.
    #[serde(rename = "wallpaper_s3_key")]
    pub output_key: ObjectKey,
    /// When the password was generated.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for GeneratedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedPassword")
            .field("entropy_bits", &self.entropy_bits)
            .field("source_key", &self.source_key)
            .field("output_key", &self.output_key)
            .finish_non_exhaustive()
    }
}

/// Generates passwords from the latest source image.
pub struct PasswordGenerator {
    collector: Arc<dyn Collector>,
    transform: Arc<dyn TransformService>,
    output: Arc<dyn OutputStore>,
    output_prefix: String,
    policy: LengthPolicy,
}

impl PasswordGenerator {
    /// Creates a generator writing transformed images under `output_prefix`.
    pub fn new(
        collector: Arc<dyn Collector>,
        transform: Arc<dyn TransformService>,
        output: Arc<dyn OutputStore>,
        output_prefix: impl Into<String>,
        policy: LengthPolicy,
    ) -> Self {
        Self {
            collector,
            transform,
            output,
            output_prefix: output_prefix.into(),
            policy,
        }
    }

    /// Generates a password of the requested length, subject to the
    /// length policy.
    pub async fn generate(&self, requested: Option<i64>) -> Result<GeneratedPassword, OneShotError> {
        let length = self.policy.resolve(requested);

        let source_key = self.collector.latest().await?;
        let original = self.collector.fetch(&source_key).await?;
        let transformed = self.transform.transform(&original).await?;

        let created_at = Utc::now();
        let output_key = ObjectKey::timestamped(&self.output_prefix, created_at);
        let output_key = self.output.store(&output_key, &transformed).await?;

        let password = keygen::derive(&transformed, length as i64);
        let entropy_bits = keygen::entropy_estimate(&password);

        tracing::info!(
            source_key = %source_key,
            output_key = %output_key,
            length,
            entropy_bits,
            "Generated password"
        );

        Ok(GeneratedPassword {
            password,
            entropy_bits,
            source_key,
            output_key,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn generator(transform: Arc<dyn TransformService>, output: Arc<dyn OutputStore>) -> PasswordGenerator {
        PasswordGenerator::new(
            Arc::new(FixedCollector::new("lava_3.jpg", b"LAMP1")),
            transform,
            output,
            "wallpaper_",
            LengthPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_uses_transformed_bytes() {
        let output = Arc::new(MemoryOutput::new());
        let generated = generator(Arc::new(ReversingTransform), output.clone())
            .generate(Some(24))
            .await
            .unwrap();

        assert_eq!(generated.password, keygen::derive(b"1PMAL", 24));
        assert_eq!(generated.entropy_bits, 146);
        assert_eq!(generated.source_key.as_str(), "lava_3.jpg");
        assert_eq!(output.keys(), vec![generated.output_key.clone()]);
    }

    #[tokio::test]
    async fn test_generate_applies_policy() {
        let passwords = generator(Arc::new(ReversingTransform), Arc::new(MemoryOutput::new()));

        assert_eq!(passwords.generate(None).await.unwrap().password.len(), 20);
        assert_eq!(passwords.generate(Some(4)).await.unwrap().password.len(), 20);
        assert_eq!(passwords.generate(Some(64)).await.unwrap().password.len(), 32);
    }

    #[tokio::test]
    async fn test_generate_fails_on_transform_error() {
        let passwords = generator(Arc::new(FailingTransform), Arc::new(MemoryOutput::new()));

        assert!(matches!(
            passwords.generate(None).await,
            Err(OneShotError::Transform(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_fails_on_upload_error() {
        let passwords = generator(Arc::new(ReversingTransform), Arc::new(FailingOutput));

        assert!(matches!(
            passwords.generate(None).await,
            Err(OneShotError::Upload(_))
        ));
    }
}
