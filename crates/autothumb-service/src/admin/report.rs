//! Reports returned by the administrative operations.

use std::fmt;

use serde::Serialize;

use autothumb_core::error::{AppError, ErrorKind};
use autothumb_core::types::record::ModelRecord;

use super::driver::DriverOutcome;

/// A failure tied to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    /// Model label.
    pub model: String,
    /// Thumbnail field.
    pub field: String,
    /// Primary key.
    pub record_id: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

impl RecordError {
    /// Describe `error` raised while processing `field` of `record`.
    pub fn new(record: &ModelRecord, field: &str, error: &AppError) -> Self {
        Self {
            model: record.model.to_string(),
            field: field.to_string(),
            record_id: record.id.to_string(),
            kind: error.kind,
            message: error.message.clone(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(pk={}).{}: {}: {}",
            self.model, self.record_id, self.field, self.kind, self.message
        )
    }
}

/// How a field was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Records were visited.
    Processed,
    /// No record has a source image.
    NoRecords,
    /// Size and mode match the last run; nothing to do.
    Unchanged,
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processed => "processed",
            Self::NoRecords => "no records",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Per-field line of a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    /// Model label.
    pub model: String,
    /// Thumbnail field.
    pub field: String,
    /// How the field was handled.
    pub status: FieldStatus,
    /// Records visited.
    pub processed: u64,
    /// Thumbnails (re)generated, or that would be in a dry run.
    pub regenerated: u64,
    /// Records left alone.
    pub skipped: u64,
    /// Records that failed.
    pub errors: u64,
}

/// Totals of a `generate` or `regenerate` run, merged across fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Nothing was rendered or written.
    pub dry_run: bool,
    /// Records visited.
    pub processed: u64,
    /// Thumbnails (re)generated, or that would be in a dry run.
    pub regenerated: u64,
    /// Records left alone.
    pub skipped: u64,
    /// Per-record failures.
    pub errors: Vec<RecordError>,
    /// Cache keys removed by `clear_cache`.
    pub cache_entries_cleared: u64,
    /// Per-field breakdown.
    pub fields: Vec<FieldSummary>,
}

impl Report {
    /// Empty report.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Fold one field's driver outcome into the totals.
    pub fn absorb(&mut self, model: &str, field: &str, outcome: DriverOutcome) {
        self.processed += outcome.processed;
        self.regenerated += outcome.success_count;
        self.skipped += outcome.skipped;
        self.fields.push(FieldSummary {
            model: model.to_string(),
            field: field.to_string(),
            status: FieldStatus::Processed,
            processed: outcome.processed,
            regenerated: outcome.success_count,
            skipped: outcome.skipped,
            errors: outcome.errors.len() as u64,
        });
        self.errors.extend(outcome.errors);
    }

    /// Note a field that was not visited.
    pub fn note_field(&mut self, model: &str, field: &str, status: FieldStatus) {
        self.fields.push(FieldSummary {
            model: model.to_string(),
            field: field.to_string(),
            status,
            processed: 0,
            regenerated: 0,
            skipped: 0,
            errors: 0,
        });
    }

    /// Whether every visited record succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
