//! Thumbnail field and its save hooks.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use autothumb_core::config::thumbnail::ThumbnailFieldDecl;
use autothumb_core::result::AppResult;
use autothumb_core::types::record::{ModelRecord, RecordId};
use autothumb_core::types::thumbnail::{
    CachedThumbnailState, OutputFormat, SourceImageDescriptor, ThumbnailConfig,
};
use autothumb_storage::thumbnail::{is_owned_thumbnail, owner_tag, thumbnail_path};

use crate::context::ServiceContext;
use crate::thumbnail::descriptor::describe_source;
use crate::thumbnail::detector::{ChangeDetector, Decision, RegenerateReason};

/// What the post-save hook did for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ThumbnailOutcome {
    /// The record was already producing a thumbnail; the hook did nothing.
    Reentrant,
    /// The source field is empty.
    NoSource,
    /// The stored thumbnail is current.
    Skipped,
    /// A new thumbnail was written.
    Regenerated {
        /// Stored thumbnail path.
        path: String,
        /// Output width.
        width: u32,
        /// Output height.
        height: u32,
        /// Why it was produced.
        reason: RegenerateReason,
    },
}

/// Hook outcome tagged with the thumbnail field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOutcome {
    /// Thumbnail field name.
    pub field: String,
    /// What happened.
    pub outcome: ThumbnailOutcome,
}

/// Anything that runs the full save pipeline for a record.
///
/// Thumbnail fields persist their own result through it, so the pipeline
/// sees that write like any other save.
#[async_trait]
pub trait RecordSaver: Send + Sync {
    /// Save `record`, restricted to `update_fields` when given.
    async fn save(
        &self,
        record: &mut ModelRecord,
        update_fields: Option<&[String]>,
    ) -> AppResult<Vec<FieldOutcome>>;
}

/// Source descriptor plus the detector's verdict for one record.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Current source state.
    pub source: SourceImageDescriptor,
    /// Whether to regenerate.
    pub decision: Decision,
}

/// A thumbnail field declared on a model.
#[derive(Debug, Clone)]
pub struct ThumbnailField {
    name: String,
    upload_to: String,
    config: ThumbnailConfig,
}

impl ThumbnailField {
    /// Create a field from an already validated configuration.
    pub fn new(name: impl Into<String>, upload_to: impl Into<String>, config: ThumbnailConfig) -> Self {
        Self {
            name: name.into(),
            upload_to: upload_to.into(),
            config,
        }
    }

    /// Validate a configuration declaration.
    pub fn from_decl(decl: &ThumbnailFieldDecl) -> AppResult<Self> {
        Ok(Self::new(&decl.name, &decl.upload_to, decl.to_config()?))
    }

    /// Field name on the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage directory for generated thumbnails.
    pub fn upload_to(&self) -> &str {
        &self.upload_to
    }

    /// Immutable thumbnail configuration.
    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Name of the source image field.
    pub fn source_field_name(&self) -> &str {
        self.config.source_field_name()
    }

    /// Where this field stores the thumbnail of `source_path` for `record_id`.
    pub fn thumbnail_path_for(&self, record_id: &RecordId, source_path: &str) -> String {
        thumbnail_path(
            &self.upload_to,
            source_path,
            &owner_tag(&record_id.0, &self.name),
            OutputFormat::for_source_path(source_path),
        )
    }

    /// Whether `path` is a thumbnail this field generated for `record_id`.
    ///
    /// Only owned files are ever deleted from storage.
    pub fn owns(&self, record_id: &RecordId, path: &str) -> bool {
        is_owned_thumbnail(&self.upload_to, path, &owner_tag(&record_id.0, &self.name))
    }

    /// Before the record is written: unset the thumbnail of a record whose
    /// source was cleared.
    ///
    /// Returns the detached path. Nothing is deleted here; the caller hands
    /// the path to [`discard`](Self::discard) once the record is persisted,
    /// or puts it back if the write fails.
    pub fn pre_save(&self, record: &mut ModelRecord) -> Option<String> {
        if record.file(self.source_field_name()).is_some() {
            return None;
        }
        let thumbnail = record.file(&self.name).map(str::to_string)?;
        record.set_file(&self.name, None);
        Some(thumbnail)
    }

    /// After the record is persisted without its thumbnail: delete the
    /// detached file and forget the cached state.
    pub async fn discard(
        &self,
        ctx: &ServiceContext,
        record: &ModelRecord,
        thumbnail: &str,
    ) -> AppResult<()> {
        ctx.cache
            .invalidate_entry(&record.model, &record.id, &self.name)
            .await;

        if !self.owns(&record.id, thumbnail) {
            warn!(
                model = %record.model,
                id = %record.id,
                field = %self.name,
                path = %thumbnail,
                "Detached thumbnail is not owned by this record, leaving it in storage"
            );
            return Ok(());
        }

        ctx.storage.delete(thumbnail).await?;
        info!(
            model = %record.model,
            id = %record.id,
            field = %self.name,
            path = %thumbnail,
            "Source image cleared, deleted thumbnail"
        );
        Ok(())
    }

    /// Describe the current source and decide whether to regenerate under
    /// `config`. `None` when the source field is empty.
    pub async fn evaluate(
        &self,
        ctx: &ServiceContext,
        record: &ModelRecord,
        config: &ThumbnailConfig,
    ) -> AppResult<Option<Evaluation>> {
        let Some(source_path) = record.file(self.source_field_name()) else {
            return Ok(None);
        };

        let source = describe_source(
            ctx.storage.as_ref(),
            source_path,
            ctx.settings.fingerprint_sources,
        )
        .await?;
        let cached = ctx
            .cache
            .read_entry(&record.model, &record.id, &self.name)
            .await;
        let decision = ChangeDetector::decide(
            &source,
            config,
            record.file(&self.name).is_some(),
            cached.as_ref(),
        );

        Ok(Some(Evaluation { source, decision }))
    }

    /// After the record is written: produce the thumbnail if it is stale.
    pub async fn create_thumbnail(
        &self,
        ctx: &ServiceContext,
        saver: &dyn RecordSaver,
        record: &mut ModelRecord,
    ) -> AppResult<ThumbnailOutcome> {
        if record.is_generating_thumbnail() {
            return Ok(ThumbnailOutcome::Reentrant);
        }
        let Some(evaluation) = self.evaluate(ctx, record, &self.config).await? else {
            return Ok(ThumbnailOutcome::NoSource);
        };

        match evaluation.decision {
            Decision::Skip => {
                debug!(
                    model = %record.model,
                    id = %record.id,
                    field = %self.name,
                    "Thumbnail is current"
                );
                Ok(ThumbnailOutcome::Skipped)
            }
            Decision::Regenerate(reason) => {
                self.regenerate(ctx, saver, record, &evaluation.source, reason)
                    .await
            }
        }
    }

    /// Render, store, and assign the thumbnail for `source`.
    ///
    /// The record's re-entrancy flag is held for the duration and lowered
    /// on every exit path. The cache entry is only written once the new
    /// thumbnail is persisted; on failure it is dropped instead.
    pub async fn regenerate(
        &self,
        ctx: &ServiceContext,
        saver: &dyn RecordSaver,
        record: &mut ModelRecord,
        source: &SourceImageDescriptor,
        reason: RegenerateReason,
    ) -> AppResult<ThumbnailOutcome> {
        if !record.begin_thumbnail_generation() {
            return Ok(ThumbnailOutcome::Reentrant);
        }
        let result = self.produce(ctx, saver, record, &source.name).await;
        record.finish_thumbnail_generation();

        match result {
            Ok((path, width, height)) => {
                let state = CachedThumbnailState::capture(&self.config, source);
                ctx.cache
                    .write_entry(&record.model, &record.id, &self.name, &state)
                    .await;
                info!(
                    model = %record.model,
                    id = %record.id,
                    field = %self.name,
                    %reason,
                    path = %path,
                    width,
                    height,
                    "Generated thumbnail"
                );
                Ok(ThumbnailOutcome::Regenerated {
                    path,
                    width,
                    height,
                    reason,
                })
            }
            Err(e) => {
                ctx.cache
                    .invalidate_entry(&record.model, &record.id, &self.name)
                    .await;
                warn!(
                    model = %record.model,
                    id = %record.id,
                    field = %self.name,
                    error = %e,
                    "Thumbnail generation failed"
                );
                Err(e)
            }
        }
    }

    async fn produce(
        &self,
        ctx: &ServiceContext,
        saver: &dyn RecordSaver,
        record: &mut ModelRecord,
        source_path: &str,
    ) -> AppResult<(String, u32, u32)> {
        let bytes = ctx.storage.read_bytes(source_path).await?;
        let format = OutputFormat::for_source_path(source_path);
        let artifact = ctx.renderer.render(bytes, &self.config, format).await?;

        let target = self.thumbnail_path_for(&record.id, source_path);
        let stored = ctx.storage.write(&target, artifact.bytes).await?;

        let previous = record.file(&self.name).map(str::to_string);
        record.set_file(&self.name, Some(stored.clone()));
        saver
            .save(record, Some(std::slice::from_ref(&self.name)))
            .await?;

        if let Some(previous) =
            previous.filter(|p| p != &stored && self.owns(&record.id, p))
        {
            if let Err(e) = ctx.storage.delete(&previous).await {
                warn!(path = %previous, error = %e, "Could not delete replaced thumbnail");
            }
        }

        Ok((stored, artifact.width, artifact.height))
    }
}
