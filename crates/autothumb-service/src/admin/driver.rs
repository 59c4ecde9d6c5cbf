//! Bulk regeneration over a set of records.

use serde::Serialize;
use tracing::{error, info, warn};

use autothumb_core::result::AppResult;
use autothumb_core::types::record::ModelRecord;
use autothumb_core::types::thumbnail::ThumbnailConfig;

use crate::model::saver::ModelSaver;
use crate::thumbnail::detector::Decision;
use crate::thumbnail::field::{ThumbnailField, ThumbnailOutcome};

use super::report::RecordError;

/// Knobs for one driver run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Decide only; never render or write.
    pub dry_run: bool,
    /// Regenerate every record regardless of cached state.
    pub force: bool,
    /// Leave records that already have a thumbnail alone (unless `force`).
    pub only_missing: bool,
}

/// Counts and failures of one driver run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverOutcome {
    /// Records visited.
    pub processed: u64,
    /// Thumbnails produced, or that would be in a dry run.
    pub success_count: u64,
    /// Records left alone.
    pub skipped: u64,
    /// Records that failed; the run carried on past each of them.
    pub errors: Vec<RecordError>,
}

/// Runs the change detector and, unless dry-running, the generator over
/// records of one thumbnail field.
#[derive(Debug, Clone, Copy)]
pub struct RegenerationDriver<'a> {
    saver: &'a ModelSaver,
}

impl<'a> RegenerationDriver<'a> {
    /// Creates a driver that persists through `saver`.
    pub fn new(saver: &'a ModelSaver) -> Self {
        Self { saver }
    }

    /// Process `records` in order. Never fails as a whole: per-record
    /// errors are collected in the outcome.
    pub async fn run(
        &self,
        field: &ThumbnailField,
        records: Vec<ModelRecord>,
        options: RunOptions,
    ) -> DriverOutcome {
        let config = if options.force {
            field.config().forced()
        } else {
            field.config().clone()
        };

        let mut outcome = DriverOutcome::default();
        for mut record in records {
            outcome.processed += 1;

            if options.only_missing && !options.force && record.file(field.name()).is_some() {
                outcome.skipped += 1;
                continue;
            }

            match self
                .process(field, &config, &mut record, options.dry_run)
                .await
            {
                Ok(true) => outcome.success_count += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    if e.is_record_level() {
                        warn!(
                            model = %record.model,
                            id = %record.id,
                            field = %field.name(),
                            error = %e,
                            "Thumbnail regeneration failed for record"
                        );
                    } else {
                        error!(
                            model = %record.model,
                            id = %record.id,
                            field = %field.name(),
                            error = %e,
                            "Thumbnail regeneration failed"
                        );
                    }
                    outcome.errors.push(RecordError::new(&record, field.name(), &e));
                }
            }
        }

        if !outcome.errors.is_empty() {
            warn!(
                field = %field.name(),
                errors = outcome.errors.len(),
                "Thumbnail regeneration completed with errors"
            );
        }
        outcome
    }

    /// `Ok(true)` when a thumbnail was (or would be) produced.
    async fn process(
        &self,
        field: &ThumbnailField,
        config: &ThumbnailConfig,
        record: &mut ModelRecord,
        dry_run: bool,
    ) -> AppResult<bool> {
        let ctx = self.saver.context();
        let Some(evaluation) = field.evaluate(ctx, record, config).await? else {
            return Ok(false);
        };
        let Decision::Regenerate(reason) = evaluation.decision else {
            return Ok(false);
        };

        if dry_run {
            info!(
                model = %record.model,
                id = %record.id,
                field = %field.name(),
                %reason,
                "Would regenerate thumbnail"
            );
            return Ok(true);
        }

        let produced = field
            .regenerate(ctx, self.saver, record, &evaluation.source, reason)
            .await?;
        Ok(matches!(produced, ThumbnailOutcome::Regenerated { .. }))
    }
}
