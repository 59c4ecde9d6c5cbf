//! Thumbnail generation command.

use clap::Args;

use autothumb_core::error::AppError;

use super::Services;
use crate::output::{self, OutputFormat};

/// Arguments for the generate command
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Only this model (`app_label.ModelName`)
    #[arg(short, long)]
    pub model: Option<String>,
    /// Only this thumbnail field
    #[arg(long)]
    pub field: Option<String>,
    /// Regenerate records that already have a thumbnail
    #[arg(long)]
    pub force: bool,
    /// Report what would be generated without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the generate command
pub async fn execute(
    args: &GenerateArgs,
    services: &Services,
    format: OutputFormat,
) -> Result<(), AppError> {
    let report = services
        .admin
        .generate(
            args.model.as_deref(),
            args.field.as_deref(),
            args.force,
            args.dry_run,
        )
        .await?;

    output::print_report(&report, format);
    Ok(())
}
