//! Record repository trait for persisted models.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::record::{ModelLabel, ModelRecord, RecordId};

/// Storage of model records.
///
/// Entity-specific query methods are kept to what thumbnail maintenance
/// needs: lookups by key and "every record whose file field is set".
#[async_trait]
pub trait RecordRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a record by its primary key.
    async fn find_by_id(&self, model: &ModelLabel, id: &RecordId)
    -> AppResult<Option<ModelRecord>>;

    /// All records of `model` whose `field` is non-null and non-empty,
    /// ordered by primary key.
    async fn find_with_file(&self, model: &ModelLabel, field: &str)
    -> AppResult<Vec<ModelRecord>>;

    /// Persist a record. With `update_fields`, only those file fields are
    /// written and the record must already exist.
    async fn save(&self, record: &ModelRecord, update_fields: Option<&[String]>) -> AppResult<()>;
}
