//! Configuration management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use autothumb_core::config::AppConfig;
use autothumb_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration and list the declared thumbnail fields
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// One declared thumbnail field.
#[derive(Debug, Serialize, Tabled)]
struct FieldRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Upload to")]
    upload_to: String,
    #[tabled(rename = "Force")]
    force: bool,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    env: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path, env).await?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path, env).await {
            Ok(config) => {
                let rows = field_rows(&config)?;
                if format == OutputFormat::Table {
                    output::print_success(&format!("Configuration '{}' is valid", config_path));
                    println!("  Storage: {}", config.storage.provider);
                    println!("  Cache: {}", config.cache.provider);
                    if config.cache.provider == "redis" {
                        println!("  Redis: {}", mask_password(&config.cache.redis.url));
                    }
                    println!("  Records: {}", config.records.manifest_path);
                }
                output::print_list(&rows, format);
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create dir: {}", e)))?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {}", e)))?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}

fn field_rows(config: &AppConfig) -> Result<Vec<FieldRow>, AppError> {
    let mut rows = Vec::new();
    for model in &config.models {
        for decl in &model.thumbnails {
            let field = decl.to_config()?;
            rows.push(FieldRow {
                model: model.label.clone(),
                field: decl.name.clone(),
                source: field.source_field_name().to_string(),
                size: field.target_size().to_string(),
                mode: field.resize_mode().to_string(),
                upload_to: decl.upload_to.clone(),
                force: field.force_regenerate(),
            });
        }
    }
    Ok(rows)
}

/// Mask password in a connection URL for display
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                let mut masked = url[..colon_pos + 1].to_string();
                masked.push_str("****");
                masked.push_str(&url[at_pos..]);
                return masked;
            }
        }
    }
    url.to_string()
}
