//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use autothumb_service::Report;
use autothumb_service::admin::FieldSummary;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Table
    }
}

/// One line of the per-field report table.
#[derive(Debug, Tabled)]
struct FieldRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Processed")]
    processed: u64,
    #[tabled(rename = "Regenerated")]
    regenerated: u64,
    #[tabled(rename = "Skipped")]
    skipped: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
}

impl From<&FieldSummary> for FieldRow {
    fn from(summary: &FieldSummary) -> Self {
        Self {
            model: summary.model.clone(),
            field: summary.field.clone(),
            status: summary.status.to_string(),
            processed: summary.processed,
            regenerated: summary.regenerated,
            skipped: summary.skipped,
            errors: summary.errors,
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a generate/regenerate report.
///
/// Table output lists the fields, then each per-record failure, then the
/// totals.
pub fn print_report(report: &Report, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_item(report, format);
        return;
    }

    if report.fields.is_empty() {
        println!("No models with thumbnail fields matched.");
    } else {
        let rows: Vec<FieldRow> = report.fields.iter().map(FieldRow::from).collect();
        println!("{}", Table::new(rows));
    }

    for error in &report.errors {
        print_error(&error.to_string());
    }

    let verb = if report.dry_run {
        "would be regenerated"
    } else {
        "regenerated"
    };
    print_kv("Processed", &report.processed.to_string());
    print_kv(
        &format!("Thumbnails {verb}"),
        &report.regenerated.to_string(),
    );
    print_kv("Skipped", &report.skipped.to_string());
    print_kv("Errors", &report.errors.len().to_string());
    if report.cache_entries_cleared > 0 {
        print_kv(
            "Cache entries cleared",
            &report.cache_entries_cleared.to_string(),
        );
    }

    if report.dry_run {
        print_warning("Dry run: nothing was written");
    } else if report.is_clean() {
        print_success("Done");
    } else {
        print_warning(&format!(
            "Completed with {} error(s)",
            report.errors.len()
        ));
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
