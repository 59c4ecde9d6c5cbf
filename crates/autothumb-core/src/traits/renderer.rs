//! Thumbnail rendering seam.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::types::thumbnail::{OutputFormat, ThumbnailArtifact, ThumbnailConfig};

/// Turns source image bytes into an encoded thumbnail.
///
/// Fails with a `Decode` error when the bytes are not an image and with
/// `UnsupportedFormat` when the image format is outside the supported set.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync + std::fmt::Debug + 'static {
    /// Render a thumbnail for `config` in the requested output format.
    async fn render(
        &self,
        source: Bytes,
        config: &ThumbnailConfig,
        format: OutputFormat,
    ) -> AppResult<ThumbnailArtifact>;
}
