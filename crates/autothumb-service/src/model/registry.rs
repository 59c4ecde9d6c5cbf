//! Registry of models and their thumbnail fields.

use autothumb_core::config::AppConfig;
use autothumb_core::error::AppError;
use autothumb_core::result::AppResult;
use autothumb_core::types::record::ModelLabel;

use crate::thumbnail::field::ThumbnailField;

/// A model and its thumbnail fields, in declaration order.
#[derive(Debug, Clone)]
pub struct RegisteredModel {
    /// Model label.
    pub label: ModelLabel,
    /// Thumbnail fields.
    pub fields: Vec<ThumbnailField>,
}

/// All models that declare thumbnail fields.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<RegisteredModel>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, validating every field.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut registry = Self::new();
        for decl in &config.models {
            let label = decl.model_label()?;
            let fields = decl
                .thumbnails
                .iter()
                .map(|field| {
                    ThumbnailField::from_decl(field).map_err(|e| {
                        AppError::configuration(format!("{label}.{}: {}", field.name, e.message))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;
            registry.register(label, fields)?;
        }
        Ok(registry)
    }

    /// Add a model. A model can only be registered once.
    pub fn register(&mut self, label: ModelLabel, fields: Vec<ThumbnailField>) -> AppResult<()> {
        if self.get(&label).is_some() {
            return Err(AppError::configuration(format!(
                "model '{label}' is registered more than once"
            )));
        }
        self.models.push(RegisteredModel { label, fields });
        Ok(())
    }

    /// Look up a model.
    pub fn get(&self, label: &ModelLabel) -> Option<&RegisteredModel> {
        self.models.iter().find(|m| &m.label == label)
    }

    /// Thumbnail fields of a model; empty for unknown models.
    pub fn fields_for(&self, label: &ModelLabel) -> &[ThumbnailField] {
        self.get(label).map(|m| m.fields.as_slice()).unwrap_or(&[])
    }

    /// Models with at least one thumbnail field, optionally restricted to
    /// the `app_label.ModelName` given in `model_filter`.
    pub fn models_with_thumbnail_fields(
        &self,
        model_filter: Option<&str>,
    ) -> AppResult<Vec<&RegisteredModel>> {
        let filter = model_filter.map(ModelLabel::parse).transpose()?;
        Ok(self
            .models
            .iter()
            .filter(|m| !m.fields.is_empty())
            .filter(|m| filter.as_ref().is_none_or(|f| &m.label == f))
            .collect())
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
