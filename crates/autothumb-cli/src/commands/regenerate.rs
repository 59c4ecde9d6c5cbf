//! Thumbnail regeneration command.

use clap::Args;

use autothumb_core::error::AppError;

use super::Services;
use crate::output::{self, OutputFormat};

/// Arguments for the regenerate command
#[derive(Debug, Args)]
pub struct RegenerateArgs {
    /// Only this model (`app_label.ModelName`)
    #[arg(short, long)]
    pub model: Option<String>,
    /// Only this thumbnail field
    #[arg(long)]
    pub field: Option<String>,
    /// Regenerate even when size and mode are unchanged
    #[arg(long)]
    pub force: bool,
    /// Report what would be regenerated without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Drop cached thumbnail state of the selected models first
    #[arg(long)]
    pub clear_cache: bool,
}

/// Execute the regenerate command
pub async fn execute(
    args: &RegenerateArgs,
    services: &Services,
    format: OutputFormat,
) -> Result<(), AppError> {
    let report = services
        .admin
        .regenerate(
            args.model.as_deref(),
            args.field.as_deref(),
            args.force,
            args.dry_run,
            args.clear_cache,
        )
        .await?;

    output::print_report(&report, format);
    Ok(())
}
