//! Storage manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use autothumb_core::config::storage::StorageConfig;
use autothumb_core::error::AppError;
use autothumb_core::result::AppResult;
use autothumb_core::traits::storage::{StorageObjectMeta, StorageProvider};

/// Wraps the storage provider selected by configuration.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// The inner storage provider.
    inner: Arc<dyn StorageProvider>,
}

impl StorageManager {
    /// Create a storage manager from configuration.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn StorageProvider> = match config.provider.as_str() {
            #[cfg(feature = "local")]
            "local" => {
                info!(root = %config.local.root_path, "Initializing local storage provider");
                Arc::new(crate::providers::LocalStorageProvider::new(&config.local.root_path).await?)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: local"
                )));
            }
        };
        Ok(Self { inner })
    }

    /// Create a storage manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn StorageProvider>) -> Self {
        Self { inner: provider }
    }

    /// Shared handle to the inner provider.
    pub fn provider(&self) -> Arc<dyn StorageProvider> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl StorageProvider for StorageManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<String> {
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        self.inner.metadata(path).await
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        self.inner.list(path).await
    }
}
