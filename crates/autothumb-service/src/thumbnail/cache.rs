//! Defensive access to the thumbnail cache.
//!
//! The cache only ever hints that a thumbnail is current. Every read
//! failure is reported as a miss and every write failure is logged and
//! dropped; nothing here returns an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use autothumb_cache::keys;
use autothumb_core::traits::cache::CacheProvider;
use autothumb_core::types::record::{ModelLabel, RecordId};
use autothumb_core::types::thumbnail::{
    CacheEntry, CachedThumbnailState, ResizeMode, ThumbnailConfig, ThumbnailSize,
};

/// Size and mode a field last produced thumbnails with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFieldConfig {
    /// Target size.
    pub size: ThumbnailSize,
    /// Resize mode.
    pub mode: ResizeMode,
}

impl From<&ThumbnailConfig> for StoredFieldConfig {
    fn from(config: &ThumbnailConfig) -> Self {
        Self {
            size: config.target_size(),
            mode: config.resize_mode(),
        }
    }
}

/// Cache wrapper used by the save hook and the admin operations.
#[derive(Clone)]
pub struct ThumbnailCache {
    provider: Arc<dyn CacheProvider>,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ThumbnailCache {
    /// Wrap a provider. `ttl` of `None` keeps entries until evicted.
    pub fn new(provider: Arc<dyn CacheProvider>, ttl: Option<Duration>) -> Self {
        Self { provider, ttl }
    }

    /// Whether the backend answers. Errors count as unreachable.
    pub async fn is_available(&self) -> bool {
        match self.provider.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                debug!(error = %e, "Cache health check failed");
                false
            }
        }
    }

    /// Read the state behind a record's stored thumbnail.
    pub async fn read_entry(
        &self,
        model: &ModelLabel,
        record_id: &RecordId,
        field: &str,
    ) -> Option<CacheEntry> {
        let key = keys::record_thumbnail(model, record_id, field);
        let value: CachedThumbnailState = self.read_json(&key).await?;
        Some(CacheEntry { key, value })
    }

    /// Record the state that produced a freshly stored thumbnail.
    pub async fn write_entry(
        &self,
        model: &ModelLabel,
        record_id: &RecordId,
        field: &str,
        value: &CachedThumbnailState,
    ) {
        let key = keys::record_thumbnail(model, record_id, field);
        self.write_json(&key, value).await;
    }

    /// Forget a record's entry.
    pub async fn invalidate_entry(&self, model: &ModelLabel, record_id: &RecordId, field: &str) {
        let key = keys::record_thumbnail(model, record_id, field);
        if let Err(e) = self.provider.delete(&key).await {
            debug!(key, error = %e, "Could not delete thumbnail cache entry");
        }
    }

    /// Size and mode the field was last generated with.
    pub async fn read_field_config(
        &self,
        model: &ModelLabel,
        field: &str,
    ) -> Option<StoredFieldConfig> {
        self.read_json(&keys::field_config(model, field)).await
    }

    /// Remember the field's current size and mode.
    pub async fn store_field_config(&self, model: &ModelLabel, field: &str, config: &ThumbnailConfig) {
        let key = keys::field_config(model, field);
        self.write_json(&key, &StoredFieldConfig::from(config)).await;
    }

    /// Drop every entry of a model. Returns how many keys were removed.
    pub async fn clear_model(&self, model: &ModelLabel) -> u64 {
        let pattern = keys::model_pattern(model);
        match self.provider.delete_pattern(&pattern).await {
            Ok(count) => count,
            Err(e) => {
                debug!(pattern, error = %e, "Could not clear thumbnail cache");
                0
            }
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.provider.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(key, error = %e, "Thumbnail cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Unreadable thumbnail cache entry, treating as miss");
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                debug!(key, error = %e, "Could not serialize thumbnail cache entry");
                return;
            }
        };
        if let Err(e) = self.provider.set(key, &json, self.ttl).await {
            debug!(key, error = %e, "Thumbnail cache write failed");
        }
    }
}
