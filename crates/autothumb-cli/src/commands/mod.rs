//! CLI command definitions and dispatch.

pub mod cache;
pub mod config;
pub mod generate;
pub mod record;
pub mod regenerate;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::output::OutputFormat;
use autothumb_cache::CacheManager;
use autothumb_core::config::AppConfig;
use autothumb_core::error::AppError;
use autothumb_database::{ManifestFile, ManifestRecordRepository};
use autothumb_service::{ModelRegistry, ModelSaver, ServiceContext, ThumbnailAdmin};
use autothumb_storage::{StorageManager, ThumbnailGenerator};

/// autothumb: keeps model thumbnails in step with their source images
#[derive(Debug, Parser)]
#[command(name = "autothumb", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}`
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate missing thumbnails
    Generate(generate::GenerateArgs),
    /// Regenerate thumbnails after a size or mode change
    Regenerate(regenerate::RegenerateArgs),
    /// Thumbnail cache maintenance
    Cache(cache::CacheArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Record inspection and saves
    Record(record::RecordArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        if let Commands::Config(args) = &self.command {
            return config::execute(args, &self.config, self.env.as_deref(), self.format).await;
        }

        let config = load_config(&self.config, self.env.as_deref()).await?;
        crate::init_tracing(&config.logging);
        let services = Services::build(&config).await?;

        match &self.command {
            Commands::Generate(args) => generate::execute(args, &services, self.format).await,
            Commands::Regenerate(args) => regenerate::execute(args, &services, self.format).await,
            Commands::Cache(args) => cache::execute(args, &services, self.format).await,
            Commands::Record(args) => record::execute(args, &services, self.format).await,
            Commands::Config(_) => Ok(()),
        }
    }
}

/// Everything a command needs, wired from configuration.
#[derive(Debug, Clone)]
pub struct Services {
    /// Record store, kept concrete for listing.
    pub records: Arc<ManifestRecordRepository>,
    /// Save pipeline.
    pub saver: ModelSaver,
    /// Bulk operations.
    pub admin: ThumbnailAdmin,
}

impl Services {
    /// Connect storage, cache and the record store, check that they answer,
    /// then register models.
    pub async fn build(config: &AppConfig) -> Result<Self, AppError> {
        let storage = StorageManager::new(&config.storage).await?;
        let cache = CacheManager::new(&config.cache).await?;
        let records = Arc::new(
            ManifestRecordRepository::open(ManifestFile::new(&config.records.manifest_path))
                .await?,
        );

        let ctx = ServiceContext::new(
            Arc::new(storage),
            records.clone(),
            Arc::new(ThumbnailGenerator::new()),
            Arc::new(cache),
            config.cache.entry_ttl(),
            config.thumbnails.clone(),
        );
        ctx.check_backends().await?;
        let registry = Arc::new(ModelRegistry::from_config(config)?);
        debug!(
            models = registry.len(),
            storage = %config.storage.provider,
            cache = %config.cache.provider,
            "Services ready"
        );
        let saver = ModelSaver::new(ctx, registry);

        Ok(Self {
            records,
            admin: ThumbnailAdmin::new(saver.clone()),
            saver,
        })
    }
}

/// Helper: load configuration from file
pub async fn load_config(config_path: &str, env: Option<&str>) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path, env)
}
