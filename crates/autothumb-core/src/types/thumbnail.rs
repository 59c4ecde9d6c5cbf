//! Thumbnail configuration, change-detection snapshots, and output artifacts.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// How the source image is fitted into the target box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Keep the aspect ratio and stay inside the box. One axis may come out smaller.
    #[default]
    Fit,
    /// Scale to cover the box, then center-crop to exactly the box.
    #[serde(alias = "cover")]
    Fill,
}

impl ResizeMode {
    /// Accepted spellings, in the order they are reported in errors.
    pub const ACCEPTED: [&'static str; 3] = ["fit", "fill", "cover"];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(Self::Fit),
            "fill" | "cover" => Ok(Self::Fill),
            other => Err(AppError::configuration(format!(
                "'resize_method' must be one of {:?}, got '{other}'",
                Self::ACCEPTED
            ))),
        }
    }
}

/// Target thumbnail dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThumbnailSize {
    /// Target width.
    pub width: u32,
    /// Target height.
    pub height: u32,
}

impl ThumbnailSize {
    /// Size used when a field declaration does not give one.
    pub const DEFAULT: Self = Self {
        width: 300,
        height: 300,
    };

    /// Create a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> AppResult<Self> {
        if width == 0 || height == 0 {
            return Err(AppError::configuration(
                "'size' dimensions must be positive integers",
            ));
        }
        Ok(Self { width, height })
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Immutable per-field thumbnail declaration.
///
/// Built once when a model's thumbnail field is declared. Construction is
/// the only place validation happens, so every live value is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailConfig {
    source_field_name: String,
    target_size: ThumbnailSize,
    resize_mode: ResizeMode,
    force_regenerate: bool,
}

impl ThumbnailConfig {
    /// Validate and build a configuration.
    pub fn new(
        source_field_name: impl Into<String>,
        target_size: ThumbnailSize,
        resize_mode: ResizeMode,
        force_regenerate: bool,
    ) -> AppResult<Self> {
        let source_field_name = source_field_name.into();
        if source_field_name.trim().is_empty() {
            return Err(AppError::configuration(
                "thumbnail field requires a 'source_field' parameter",
            ));
        }
        // Re-check in case the size was built as a struct literal.
        let target_size = ThumbnailSize::new(target_size.width, target_size.height)?;

        Ok(Self {
            source_field_name,
            target_size,
            resize_mode,
            force_regenerate,
        })
    }

    /// Name of the image field thumbnails are derived from.
    pub fn source_field_name(&self) -> &str {
        &self.source_field_name
    }

    /// Target box.
    pub fn target_size(&self) -> ThumbnailSize {
        self.target_size
    }

    /// Resize mode.
    pub fn resize_mode(&self) -> ResizeMode {
        self.resize_mode
    }

    /// Whether every save regenerates regardless of cached state.
    pub fn force_regenerate(&self) -> bool {
        self.force_regenerate
    }

    /// Copy of this configuration with `force_regenerate` switched on.
    pub fn forced(&self) -> Self {
        Self {
            force_regenerate: true,
            ..self.clone()
        }
    }
}

/// Lightweight identity of a source image used for change comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceImageDescriptor {
    /// Stored file name (storage path).
    pub name: String,
    /// Size in bytes.
    pub byte_size: u64,
    /// Optional content hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fingerprint: Option<String>,
}

/// The configuration and source state that produced the stored thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedThumbnailState {
    /// Target size used.
    pub size: ThumbnailSize,
    /// Resize mode used.
    pub mode: ResizeMode,
    /// Source the thumbnail was derived from.
    pub source: SourceImageDescriptor,
}

impl CachedThumbnailState {
    /// Snapshot the state for a configuration and source.
    pub fn capture(config: &ThumbnailConfig, source: &SourceImageDescriptor) -> Self {
        Self {
            size: config.target_size(),
            mode: config.resize_mode(),
            source: source.clone(),
        }
    }
}

/// A cache record keyed by model, record, and field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Cache key the value was read from or will be written to.
    pub key: String,
    /// Stored state.
    pub value: CachedThumbnailState,
}

/// Encoded output format for a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG, quality 85. Has no alpha channel.
    Jpeg,
    /// PNG.
    Png,
    /// Lossless WebP.
    WebP,
}

impl OutputFormat {
    /// Pick the output format from a source file extension. Unknown or
    /// missing extensions fall back to JPEG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "webp" => Self::WebP,
            _ => Self::Jpeg,
        }
    }

    /// Pick the output format for a stored source path.
    pub fn for_source_path(path: &str) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => Self::Jpeg,
        }
    }

    /// Whether the format can store an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }
}

/// Encoded thumbnail bytes plus the dimensions actually produced.
#[derive(Debug, Clone)]
pub struct ThumbnailArtifact {
    /// Encoded image.
    pub bytes: Bytes,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Encoding used.
    pub format: OutputFormat,
}
