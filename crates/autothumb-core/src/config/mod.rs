//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod cache;
pub mod logging;
pub mod records;
pub mod storage;
pub mod thumbnail;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use self::cache::CacheConfig;
use self::logging::LoggingConfig;
use self::records::RecordsConfig;
use self::storage::StorageConfig;
use self::thumbnail::{ModelDecl, ThumbnailSettings};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay + env vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// File storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Engine-wide thumbnail settings.
    #[serde(default)]
    pub thumbnails: ThumbnailSettings,
    /// Record store settings.
    #[serde(default)]
    pub records: RecordsConfig,
    /// Models carrying thumbnail fields.
    #[serde(default)]
    pub models: Vec<ModelDecl>,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the file at `config_path` with an optional `config/{env}`
    /// overlay and environment variables prefixed with `AUTOTHUMB__`.
    /// Every thumbnail field declaration is validated before returning.
    pub fn load(config_path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));
        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("AUTOTHUMB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check every model and thumbnail field declaration.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut labels = HashSet::new();
        for model in &self.models {
            let label = model.model_label()?;
            if !labels.insert(label.to_string()) {
                return Err(AppError::configuration(format!(
                    "model '{label}' is declared more than once"
                )));
            }

            let mut names = HashSet::new();
            for field in &model.thumbnails {
                if !names.insert(field.name.as_str()) {
                    return Err(AppError::configuration(format!(
                        "thumbnail field '{}' is declared twice on '{label}'",
                        field.name
                    )));
                }
                let config = field.to_config().map_err(|e| {
                    AppError::configuration(format!("{label}.{}: {}", field.name, e.message))
                })?;
                if config.source_field_name() == field.name {
                    return Err(AppError::configuration(format!(
                        "{label}.{}: a thumbnail field cannot be its own source",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::thumbnail::ResizeMode;

    const SAMPLE: &str = r#"
[cache]
provider = "memory"

[storage.local]
root_path = "/srv/media"

[[models]]
label = "gallery.Photo"

[[models.thumbnails]]
name = "thumbnail"
source_field = "image"
size = [150, 150]
resize_method = "cover"
"#;

    #[test]
    fn test_from_toml() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.storage.local.root_path, "/srv/media");
        assert_eq!(config.cache.entry_ttl(), None);
        assert_eq!(config.logging.level, "info");

        let model = &config.models[0];
        assert_eq!(model.label, "gallery.Photo");
        let field = model.thumbnails[0].to_config().unwrap();
        assert_eq!(field.resize_mode(), ResizeMode::Fill);
        assert_eq!(model.thumbnails[0].upload_to, "thumbnails/");
    }

    #[test]
    fn test_invalid_field_fails_load() {
        let text = SAMPLE.replace("size = [150, 150]", "size = [150, 0]");
        let err = AppConfig::from_toml(&text).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("gallery.Photo.thumbnail"));
    }

    #[test]
    fn test_self_source_rejected() {
        let text = SAMPLE.replace("source_field = \"image\"", "source_field = \"thumbnail\"");
        assert!(AppConfig::from_toml(&text).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("autothumb-missing-config");
        let path = dir.join("nope");
        let config = AppConfig::load(path.to_str().unwrap(), None).unwrap();
        assert_eq!(config.cache.provider, "memory");
        assert!(config.models.is_empty());
    }
}
