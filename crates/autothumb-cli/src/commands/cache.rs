//! Thumbnail cache maintenance commands.

use clap::{Args, Subcommand};

use autothumb_core::error::AppError;

use super::Services;
use crate::output::{self, OutputFormat};

/// Arguments for cache commands
#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Cache subcommand
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Drop cached thumbnail state so the next run re-checks every record
    Clear {
        /// Only this model (`app_label.ModelName`)
        #[arg(short, long)]
        model: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Execute cache commands
pub async fn execute(
    args: &CacheArgs,
    services: &Services,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        CacheCommand::Clear { model, yes } => {
            let registry = services.saver.registry();
            let models = registry.models_with_thumbnail_fields(model.as_deref())?;
            if models.is_empty() {
                output::print_warning("No models with thumbnail fields matched");
                return Ok(());
            }

            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Clear thumbnail cache for {} model(s)?",
                        models.len()
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;
                if !confirmed {
                    output::print_warning("Aborted");
                    return Ok(());
                }
            }

            let cache = &services.saver.context().cache;
            let mut cleared = Vec::with_capacity(models.len());
            for registered in models {
                let removed = cache.clear_model(&registered.label).await;
                cleared.push(ClearedModel {
                    model: registered.label.to_string(),
                    removed,
                });
            }

            output::print_list(&cleared, format);
            if format == OutputFormat::Table {
                output::print_success("Thumbnail cache cleared");
            }
        }
    }

    Ok(())
}

/// Keys removed for one model.
#[derive(Debug, serde::Serialize, tabled::Tabled)]
struct ClearedModel {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Removed")]
    removed: u64,
}
