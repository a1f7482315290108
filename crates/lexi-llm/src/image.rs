//! Image analysis seam for units created from photos.
//!
//! Analysis informs vocabulary generation but is never required: a unit
//! with images and no analyzer (or a failing analyzer) generates from its
//! textual context alone. The engine treats analyzer failures as a
//! degradation, not an error.

use async_trait::async_trait;
use tracing::warn;

use lexi_core::content::ImageInfo;

use crate::errors::Result;

/// An image attached to a unit at creation.
#[derive(Clone, Debug)]
pub struct ImageSource {
    /// Original filename.
    pub filename: String,
    /// Base64-encoded image bytes.
    pub data_base64: String,
}

/// Produces vocabulary-relevant descriptions of unit images.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Analyze the given images against the unit's thematic context.
    async fn analyze(&self, images: &[ImageSource], context: Option<&str>)
    -> Result<Vec<ImageInfo>>;
}

/// Analyzer that reports nothing. The default when no vision backend is
/// configured.
pub struct NoopAnalyzer;

#[async_trait]
impl ImageAnalyzer for NoopAnalyzer {
    async fn analyze(
        &self,
        images: &[ImageSource],
        _context: Option<&str>,
    ) -> Result<Vec<ImageInfo>> {
        if !images.is_empty() {
            warn!(count = images.len(), "no image analyzer configured, skipping images");
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_analyzer_returns_empty() {
        let analyzer = NoopAnalyzer;
        let images = vec![ImageSource {
            filename: "kitchen.jpg".into(),
            data_base64: "aGVsbG8=".into(),
        }];
        let result = analyzer.analyze(&images, Some("cooking")).await.unwrap();
        assert!(result.is_empty());
    }
}
