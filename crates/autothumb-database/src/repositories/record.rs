//! Record repository backed by an in-memory map and an optional manifest.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use autothumb_core::error::AppError;
use autothumb_core::result::AppResult;
use autothumb_core::traits::repository::RecordRepository;
use autothumb_core::types::record::{ModelLabel, ModelRecord, RecordId};

use crate::manifest::ManifestFile;

type RecordKey = (ModelLabel, RecordId);

/// Repository for model records.
///
/// Every mutation is written through to the manifest file when one is
/// attached; [`in_memory`](Self::in_memory) repositories never touch disk.
/// A mutation becomes visible only after the manifest write succeeds.
#[derive(Debug, Clone)]
pub struct ManifestRecordRepository {
    records: Arc<RwLock<BTreeMap<RecordKey, ModelRecord>>>,
    manifest: Option<ManifestFile>,
}

impl ManifestRecordRepository {
    /// Create an empty repository with no backing file.
    pub fn in_memory() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            manifest: None,
        }
    }

    /// Open the manifest at `manifest`, loading any existing records.
    pub async fn open(manifest: ManifestFile) -> AppResult<Self> {
        let loaded = manifest.load().await?;
        let records = loaded
            .into_iter()
            .map(|r| ((r.model.clone(), r.id.clone()), r))
            .collect();
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
            manifest: Some(manifest),
        })
    }

    /// Every record of `model`, ordered by primary key.
    pub async fn find_by_model(&self, model: &ModelLabel) -> AppResult<Vec<ModelRecord>> {
        let records = self.records.read().await;
        let mut found: Vec<ModelRecord> = records
            .values()
            .filter(|r| &r.model == model)
            .cloned()
            .collect();
        found.sort_by(|a, b| pk_order(&a.id, &b.id));
        Ok(found)
    }

    async fn flush(&self, records: &BTreeMap<RecordKey, ModelRecord>) -> AppResult<()> {
        if let Some(manifest) = &self.manifest {
            let all: Vec<ModelRecord> = records.values().cloned().collect();
            manifest.persist(&all).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for ManifestRecordRepository {
    async fn find_by_id(
        &self,
        model: &ModelLabel,
        id: &RecordId,
    ) -> AppResult<Option<ModelRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(model.clone(), id.clone())).cloned())
    }

    async fn find_with_file(
        &self,
        model: &ModelLabel,
        field: &str,
    ) -> AppResult<Vec<ModelRecord>> {
        let mut found = self.find_by_model(model).await?;
        found.retain(|r| r.file(field).is_some());
        Ok(found)
    }

    async fn save(&self, record: &ModelRecord, update_fields: Option<&[String]>) -> AppResult<()> {
        let mut records = self.records.write().await;
        let key = (record.model.clone(), record.id.clone());

        let stored = match update_fields {
            Some(fields) => {
                let mut stored = records.get(&key).cloned().ok_or_else(|| {
                    AppError::not_found(format!(
                        "Cannot update missing record {}#{}",
                        record.model, record.id
                    ))
                })?;
                for field in fields {
                    let value = record.files.get(field).cloned().flatten();
                    stored.set_file(field, value);
                }
                stored
            }
            None => {
                let mut stored = record.clone();
                stored.finish_thumbnail_generation();
                stored
            }
        };

        let mut updated = records.clone();
        updated.insert(key, stored);
        self.flush(&updated).await?;
        *records = updated;

        debug!(model = %record.model, id = %record.id, ?update_fields, "Saved record");
        Ok(())
    }
}

/// Numeric keys sort numerically, everything else lexicographically.
fn pk_order(a: &RecordId, b: &RecordId) -> Ordering {
    match (a.0.parse::<u64>(), b.0.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.0.cmp(&b.0),
    }
}
