//! Collaborators shared by every thumbnail service.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use autothumb_core::config::thumbnail::ThumbnailSettings;
use autothumb_core::error::AppError;
use autothumb_core::result::AppResult;
use autothumb_core::traits::cache::CacheProvider;
use autothumb_core::traits::renderer::ThumbnailRenderer;
use autothumb_core::traits::repository::RecordRepository;
use autothumb_core::traits::storage::StorageProvider;

use crate::thumbnail::cache::ThumbnailCache;

/// Storage, cache, record store, and renderer handles.
///
/// Cheap to clone; every handle is shared.
#[derive(Clone)]
pub struct ServiceContext {
    /// Where source images and thumbnails live.
    pub storage: Arc<dyn StorageProvider>,
    /// Record persistence.
    pub records: Arc<dyn RecordRepository>,
    /// Image pipeline.
    pub renderer: Arc<dyn ThumbnailRenderer>,
    /// Defensive wrapper over the cache backend.
    pub cache: ThumbnailCache,
    /// Engine-wide thumbnail settings.
    pub settings: ThumbnailSettings,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("storage", &self.storage.provider_type())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ServiceContext {
    /// Assemble a context.
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        records: Arc<dyn RecordRepository>,
        renderer: Arc<dyn ThumbnailRenderer>,
        cache: Arc<dyn CacheProvider>,
        cache_ttl: Option<Duration>,
        settings: ThumbnailSettings,
    ) -> Self {
        Self {
            storage,
            records,
            renderer,
            cache: ThumbnailCache::new(cache, cache_ttl),
            settings,
        }
    }

    /// Check the backends before any record is touched.
    ///
    /// Unreachable storage is an error. An unreachable cache is only
    /// logged: every lookup then reads as a miss. Returns whether the
    /// cache answered.
    pub async fn check_backends(&self) -> AppResult<bool> {
        if !self.storage.health_check().await? {
            return Err(AppError::storage(format!(
                "Storage provider '{}' is not reachable",
                self.storage.provider_type()
            )));
        }

        let cache_available = self.cache.is_available().await;
        if !cache_available {
            warn!("Cache backend unreachable, every thumbnail check will count as a cache miss");
        }
        Ok(cache_available)
    }
}
