//! Thumbnail field declarations and engine-wide thumbnail settings.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::record::ModelLabel;
use crate::types::thumbnail::{ResizeMode, ThumbnailConfig, ThumbnailSize};

/// Settings shared by every thumbnail field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThumbnailSettings {
    /// Hash source contents (BLAKE3) into the change-detection descriptor.
    /// Costs a full read of the source on every save.
    #[serde(default)]
    pub fingerprint_sources: bool,
}

/// A model and the thumbnail fields declared on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDecl {
    /// Model label, `app_label.ModelName`.
    pub label: String,
    /// Thumbnail fields, in declaration order.
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailFieldDecl>,
}

impl ModelDecl {
    /// Parsed model label.
    pub fn model_label(&self) -> AppResult<ModelLabel> {
        ModelLabel::parse(&self.label)
    }
}

/// Raw thumbnail field declaration as written in configuration.
///
/// Values are kept loosely typed here so that bad input produces the
/// field-specific messages from [`ThumbnailFieldDecl::to_config`] instead
/// of a generic deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailFieldDecl {
    /// Name of the thumbnail field on the model.
    pub name: String,
    /// Name of the source image field.
    #[serde(default)]
    pub source_field: Option<String>,
    /// Storage directory for generated thumbnails.
    #[serde(default = "default_upload_to")]
    pub upload_to: String,
    /// `[width, height]`.
    #[serde(default = "default_size")]
    pub size: Vec<i64>,
    /// `"fit"`, `"fill"` or `"cover"`.
    #[serde(default = "default_resize_method")]
    pub resize_method: String,
    /// Regenerate on every save.
    #[serde(default)]
    pub force_regenerate: bool,
}

impl ThumbnailFieldDecl {
    /// Validate the declaration into an immutable [`ThumbnailConfig`].
    pub fn to_config(&self) -> AppResult<ThumbnailConfig> {
        let source_field = self.source_field.as_deref().ok_or_else(|| {
            AppError::configuration(format!(
                "thumbnail field '{}' requires a 'source_field' parameter",
                self.name
            ))
        })?;

        if self.size.len() != 2 {
            return Err(AppError::configuration(format!(
                "'size' must have exactly 2 elements (width, height), got {}",
                self.size.len()
            )));
        }
        let (width, height) = (self.size[0], self.size[1]);
        if width <= 0 || height <= 0 {
            return Err(AppError::configuration(
                "'size' dimensions must be positive integers",
            ));
        }
        let width = u32::try_from(width)
            .map_err(|_| AppError::configuration("'size' width is too large"))?;
        let height = u32::try_from(height)
            .map_err(|_| AppError::configuration("'size' height is too large"))?;

        let mode: ResizeMode = self.resize_method.parse()?;

        ThumbnailConfig::new(
            source_field,
            ThumbnailSize::new(width, height)?,
            mode,
            self.force_regenerate,
        )
    }
}

fn default_upload_to() -> String {
    "thumbnails/".to_string()
}

fn default_size() -> Vec<i64> {
    vec![
        i64::from(ThumbnailSize::DEFAULT.width),
        i64::from(ThumbnailSize::DEFAULT.height),
    ]
}

fn default_resize_method() -> String {
    ResizeMode::Fit.as_str().to_string()
}
