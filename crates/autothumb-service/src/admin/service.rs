//! `generate` and `regenerate` administrative operations.

use tracing::info;

use autothumb_core::result::AppResult;

use crate::model::registry::RegisteredModel;
use crate::model::saver::ModelSaver;
use crate::thumbnail::cache::StoredFieldConfig;
use crate::thumbnail::field::ThumbnailField;

use super::driver::{RegenerationDriver, RunOptions};
use super::report::{FieldStatus, Report};

/// Entry point for bulk thumbnail maintenance.
#[derive(Debug, Clone)]
pub struct ThumbnailAdmin {
    saver: ModelSaver,
}

impl ThumbnailAdmin {
    /// Creates a new admin service.
    pub fn new(saver: ModelSaver) -> Self {
        Self { saver }
    }

    /// Generate thumbnails for records that lack one, or for every record
    /// with a source image when `force` is set.
    pub async fn generate(
        &self,
        model: Option<&str>,
        field: Option<&str>,
        force: bool,
        dry_run: bool,
    ) -> AppResult<Report> {
        let mut report = Report::new(dry_run);
        let options = RunOptions {
            dry_run,
            force,
            only_missing: true,
        };

        for (registered, fields) in self.select(model, field)? {
            for thumbnail_field in fields {
                self.run_field(&mut report, registered, thumbnail_field, options)
                    .await?;
            }
        }

        info!(
            dry_run,
            processed = report.processed,
            generated = report.regenerated,
            errors = report.errors.len(),
            "Thumbnail generation finished"
        );
        Ok(report)
    }

    /// Regenerate thumbnails of fields whose size or mode changed since the
    /// last run, or of every selected field when `force` is set.
    ///
    /// `clear_cache` first drops every cache entry of the selected models,
    /// which makes every field count as changed. In a dry run the cache is
    /// left untouched but the fields still count as changed, so the report
    /// matches what the real run would do.
    pub async fn regenerate(
        &self,
        model: Option<&str>,
        field: Option<&str>,
        force: bool,
        dry_run: bool,
        clear_cache: bool,
    ) -> AppResult<Report> {
        let mut report = Report::new(dry_run);
        let selection = self.select(model, field)?;
        let cache = &self.saver.context().cache;

        if clear_cache {
            for (registered, _) in &selection {
                if dry_run {
                    info!(model = %registered.label, "Would clear thumbnail cache");
                } else {
                    report.cache_entries_cleared += cache.clear_model(&registered.label).await;
                }
            }
            info!(cleared = report.cache_entries_cleared, "Thumbnail cache cleared");
        }

        let options = RunOptions {
            dry_run,
            force: true,
            only_missing: false,
        };

        for (registered, fields) in selection {
            for thumbnail_field in fields {
                let stored = cache
                    .read_field_config(&registered.label, thumbnail_field.name())
                    .await;
                let changed = clear_cache
                    || stored != Some(StoredFieldConfig::from(thumbnail_field.config()));

                if !force && !changed {
                    info!(
                        model = %registered.label,
                        field = %thumbnail_field.name(),
                        "No size change detected, skipping"
                    );
                    report.note_field(
                        &registered.label.to_string(),
                        thumbnail_field.name(),
                        FieldStatus::Unchanged,
                    );
                    continue;
                }
                if changed {
                    info!(
                        model = %registered.label,
                        field = %thumbnail_field.name(),
                        size = %thumbnail_field.config().target_size(),
                        mode = %thumbnail_field.config().resize_mode(),
                        "Size change detected"
                    );
                }

                self.run_field(&mut report, registered, thumbnail_field, options)
                    .await?;
            }
        }

        info!(
            dry_run,
            processed = report.processed,
            regenerated = report.regenerated,
            errors = report.errors.len(),
            "Thumbnail regeneration finished"
        );
        Ok(report)
    }

    /// Selected models paired with their selected fields. Models left with
    /// no field after the field filter are dropped.
    fn select<'s>(
        &'s self,
        model: Option<&str>,
        field: Option<&str>,
    ) -> AppResult<Vec<(&'s RegisteredModel, Vec<&'s ThumbnailField>)>> {
        let models = self.saver.registry().models_with_thumbnail_fields(model)?;
        Ok(models
            .into_iter()
            .map(|m| {
                let fields: Vec<&ThumbnailField> = m
                    .fields
                    .iter()
                    .filter(|f| field.is_none_or(|name| f.name() == name))
                    .collect();
                (m, fields)
            })
            .filter(|(_, fields)| !fields.is_empty())
            .collect())
    }

    async fn run_field(
        &self,
        report: &mut Report,
        registered: &RegisteredModel,
        field: &ThumbnailField,
        options: RunOptions,
    ) -> AppResult<()> {
        let ctx = self.saver.context();
        let label = registered.label.to_string();
        let records = ctx
            .records
            .find_with_file(&registered.label, field.source_field_name())
            .await?;

        info!(
            model = %label,
            field = %field.name(),
            count = records.len(),
            "Found records with source images"
        );
        if records.is_empty() {
            report.note_field(&label, field.name(), FieldStatus::NoRecords);
            return Ok(());
        }

        let outcome = RegenerationDriver::new(&self.saver)
            .run(field, records, options)
            .await;
        report.absorb(&label, field.name(), outcome);

        if !options.dry_run {
            ctx.cache
                .store_field_config(&registered.label, field.name(), field.config())
                .await;
        }
        Ok(())
    }
}
