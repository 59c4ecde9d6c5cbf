//! Record inspection and save commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use autothumb_core::error::AppError;
use autothumb_core::traits::repository::RecordRepository;
use autothumb_core::types::record::{ModelLabel, ModelRecord, RecordId};
use autothumb_service::thumbnail::{FieldOutcome, RecordSaver, ThumbnailOutcome};

use super::Services;
use crate::output::{self, OutputFormat};

/// Arguments for record commands
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Record subcommand
    #[command(subcommand)]
    pub command: RecordCommand,
}

/// Record subcommands
#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Create or update a record and run its thumbnail hooks
    Save {
        /// Model (`app_label.ModelName`)
        #[arg(short, long)]
        model: String,
        /// Primary key
        #[arg(short, long)]
        id: String,
        /// Assign a file field, as `field=path` (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Clear a file field (repeatable)
        #[arg(long = "clear")]
        clear: Vec<String>,
    },
    /// Show one record
    Show {
        /// Model (`app_label.ModelName`)
        #[arg(short, long)]
        model: String,
        /// Primary key
        #[arg(short, long)]
        id: String,
    },
    /// List records of a model
    List {
        /// Model (`app_label.ModelName`)
        #[arg(short, long)]
        model: String,
    },
}

/// Record listing row.
#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Files")]
    files: String,
}

impl From<&ModelRecord> for RecordRow {
    fn from(record: &ModelRecord) -> Self {
        let files = record
            .files
            .keys()
            .map(|name| format!("{}={}", name, record.file(name).unwrap_or("-")))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            id: record.id.to_string(),
            files,
        }
    }
}

/// Save hook result row.
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&FieldOutcome> for OutcomeRow {
    fn from(outcome: &FieldOutcome) -> Self {
        let (result, reason, path, size) = match &outcome.outcome {
            ThumbnailOutcome::Reentrant => ("re-entrant", String::new(), String::new(), String::new()),
            ThumbnailOutcome::NoSource => ("no source", String::new(), String::new(), String::new()),
            ThumbnailOutcome::Skipped => ("up to date", String::new(), String::new(), String::new()),
            ThumbnailOutcome::Regenerated {
                path,
                width,
                height,
                reason,
            } => (
                "regenerated",
                reason.to_string(),
                path.clone(),
                format!("{width}x{height}"),
            ),
        };
        Self {
            field: outcome.field.clone(),
            result: result.to_string(),
            reason,
            path,
            size,
        }
    }
}

/// Execute record commands
pub async fn execute(
    args: &RecordArgs,
    services: &Services,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        RecordCommand::Save {
            model,
            id,
            set,
            clear,
        } => {
            let label = ModelLabel::parse(model)?;
            if services.saver.registry().get(&label).is_none() {
                output::print_warning(&format!("'{}' declares no thumbnail fields", label));
            }

            let record_id = RecordId::from(id.as_str());
            let mut record = services
                .records
                .find_by_id(&label, &record_id)
                .await?
                .unwrap_or_else(|| ModelRecord::new(label, record_id));
            for (field, path) in set {
                record.set_file(field, Some(path.clone()));
            }
            for field in clear {
                record.set_file(field, None);
            }

            let outcomes = services.saver.save(&mut record, None).await?;
            let rows: Vec<OutcomeRow> = outcomes.iter().map(OutcomeRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                output::print_success(&format!("Saved {}(pk={})", record.model, record.id));
            }
        }
        RecordCommand::Show { model, id } => {
            let label = ModelLabel::parse(model)?;
            let record = services
                .records
                .find_by_id(&label, &RecordId::from(id.as_str()))
                .await?
                .ok_or_else(|| AppError::not_found(format!("{}(pk={}) not found", label, id)))?;
            output::print_item(&record, format);
        }
        RecordCommand::List { model } => {
            let label = ModelLabel::parse(model)?;
            let records = services.records.find_by_model(&label).await?;
            let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

/// Parse `field=path`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, path)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), path.to_string()))
        }
        _ => Err(format!("expected field=path, got '{raw}'")),
    }
}
