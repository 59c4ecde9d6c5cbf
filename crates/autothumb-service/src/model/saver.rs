//! Save pipeline for records with thumbnail fields.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use autothumb_core::result::AppResult;
use autothumb_core::types::record::ModelRecord;

use crate::context::ServiceContext;
use crate::model::registry::ModelRegistry;
use crate::thumbnail::field::{FieldOutcome, RecordSaver};

/// Saves records and runs the thumbnail hooks around the write.
///
/// 1. `pre_save` for every thumbnail field being written.
/// 2. The record is persisted.
/// 3. Thumbnails detached in step 1 are deleted.
/// 4. `create_thumbnail` for every thumbnail field of the model.
///
/// A failed write restores the detached paths and deletes nothing.
#[derive(Debug, Clone)]
pub struct ModelSaver {
    ctx: ServiceContext,
    registry: Arc<ModelRegistry>,
}

impl ModelSaver {
    /// Creates a new saver.
    pub fn new(ctx: ServiceContext, registry: Arc<ModelRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// Shared collaborators.
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Registered models.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

#[async_trait]
impl RecordSaver for ModelSaver {
    async fn save(
        &self,
        record: &mut ModelRecord,
        update_fields: Option<&[String]>,
    ) -> AppResult<Vec<FieldOutcome>> {
        let fields = self.registry.fields_for(&record.model);

        let mut detached = Vec::new();
        for field in fields {
            let written = update_fields.is_none_or(|names| names.iter().any(|n| n == field.name()));
            if written {
                if let Some(path) = field.pre_save(record) {
                    detached.push((field, path));
                }
            }
        }

        if let Err(e) = self.ctx.records.save(record, update_fields).await {
            for (field, path) in detached {
                record.set_file(field.name(), Some(path));
            }
            return Err(e);
        }
        debug!(model = %record.model, id = %record.id, ?update_fields, "Record saved");

        for (field, path) in &detached {
            field.discard(&self.ctx, record, path).await?;
        }

        let mut outcomes = Vec::with_capacity(fields.len());
        for field in fields {
            let outcome = field.create_thumbnail(&self.ctx, self, record).await?;
            outcomes.push(FieldOutcome {
                field: field.name().to_string(),
                outcome,
            });
        }
        Ok(outcomes)
    }
}
