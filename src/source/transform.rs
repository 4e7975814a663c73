//! Image transform service abstraction.
//!
//! A transform re-renders a source image (for example an AI outpainting
//! step producing a wallpaper). Its output only matters as bytes; callers
//! decide how to react when it fails.

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a transform service.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transform service unavailable: {0}")]
    Unavailable(String),
    #[error("transform returned no image")]
    EmptyOutput,
}

/// Trait for image transform services.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Transforms `image` into a new image.
    async fn transform(&self, image: &[u8]) -> Result<Vec<u8>, TransformError>;
}

/// Transform that returns its input unchanged.
///
/// Used when no remote transform is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransform;

#[async_trait]
impl TransformService for PassthroughTransform {
    async fn transform(&self, image: &[u8]) -> Result<Vec<u8>, TransformError> {
        if image.is_empty() {
            return Err(TransformError::EmptyOutput);
        }
        Ok(image.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let out = PassthroughTransform.transform(b"lamp").await.unwrap();
        assert_eq!(out, b"lamp");
    }

    #[tokio::test]
    async fn test_passthrough_rejects_empty() {
        assert!(matches!(
            PassthroughTransform.transform(&[]).await,
            Err(TransformError::EmptyOutput)
        ));
    }
}
