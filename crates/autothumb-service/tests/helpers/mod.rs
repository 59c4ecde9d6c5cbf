//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use autothumb_cache::memory::MemoryCacheProvider;
use autothumb_core::config::AppConfig;
use autothumb_core::config::cache::MemoryCacheConfig;
use autothumb_core::error::AppError;
use autothumb_core::result::AppResult;
use autothumb_core::traits::cache::CacheProvider;
use autothumb_core::traits::renderer::ThumbnailRenderer;
use autothumb_core::traits::repository::RecordRepository;
use autothumb_core::traits::storage::StorageProvider;
use autothumb_core::types::record::{ModelLabel, ModelRecord, RecordId};
use autothumb_core::types::thumbnail::{OutputFormat, ThumbnailArtifact, ThumbnailConfig};
use autothumb_database::ManifestRecordRepository;
use autothumb_service::{ModelRegistry, ModelSaver, ServiceContext, ThumbnailAdmin};
use autothumb_storage::ThumbnailGenerator;
use autothumb_storage::providers::LocalStorageProvider;

/// One model, one 150x150 FIT thumbnail field.
pub const FIT_CONFIG: &str = r#"
    [[models]]
    label = "gallery.Photo"

    [[models.thumbnails]]
    name = "thumbnail"
    source_field = "image"
    upload_to = "thumbnails/"
    size = [150, 150]
"#;

/// Same field switched to FILL.
pub const FILL_CONFIG: &str = r#"
    [[models]]
    label = "gallery.Photo"

    [[models.thumbnails]]
    name = "thumbnail"
    source_field = "image"
    upload_to = "thumbnails/"
    size = [150, 150]
    resize_method = "fill"
"#;

/// Same field regenerating on every save.
pub const FORCED_CONFIG: &str = r#"
    [[models]]
    label = "gallery.Photo"

    [[models.thumbnails]]
    name = "thumbnail"
    source_field = "image"
    upload_to = "thumbnails/"
    size = [150, 150]
    force_regenerate = true
"#;

pub fn photo() -> ModelLabel {
    ModelLabel::parse("gallery.Photo").unwrap()
}

/// Encode a solid image of the given size.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Bytes {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 140, 200])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    Bytes::from(buf)
}

/// Renderer that counts calls before delegating to the real generator.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    inner: ThumbnailGenerator,
    calls: AtomicUsize,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailRenderer for CountingRenderer {
    async fn render(
        &self,
        source: Bytes,
        config: &ThumbnailConfig,
        format: OutputFormat,
    ) -> AppResult<ThumbnailArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source, config, format).await
    }
}

/// Cache backend that is always unreachable.
#[derive(Debug)]
pub struct DownCache;

#[async_trait]
impl CacheProvider for DownCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::cache_unavailable("connection refused"))
    }
    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        Err(AppError::cache_unavailable("connection refused"))
    }
    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache_unavailable("connection refused"))
    }
    async fn delete_pattern(&self, _pattern: &str) -> AppResult<u64> {
        Err(AppError::cache_unavailable("connection refused"))
    }
    async fn health_check(&self) -> AppResult<bool> {
        Ok(false)
    }
}

/// Record store whose writes can be made to fail.
#[derive(Debug)]
pub struct FlakyRecords {
    inner: Arc<ManifestRecordRepository>,
    failing: AtomicBool,
}

impl FlakyRecords {
    pub fn new(inner: Arc<ManifestRecordRepository>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordRepository for FlakyRecords {
    async fn find_by_id(
        &self,
        model: &ModelLabel,
        id: &RecordId,
    ) -> AppResult<Option<ModelRecord>> {
        self.inner.find_by_id(model, id).await
    }

    async fn find_with_file(
        &self,
        model: &ModelLabel,
        field: &str,
    ) -> AppResult<Vec<ModelRecord>> {
        self.inner.find_with_file(model, field).await
    }

    async fn save(&self, record: &ModelRecord, update_fields: Option<&[String]>) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::storage("disk full"));
        }
        self.inner.save(record, update_fields).await
    }
}

/// Test application context.
pub struct TestApp {
    _dir: TempDir,
    pub storage: Arc<LocalStorageProvider>,
    pub records: Arc<ManifestRecordRepository>,
    pub flaky: Arc<FlakyRecords>,
    pub renderer: Arc<CountingRenderer>,
    pub cache: Arc<dyn CacheProvider>,
    pub ctx: ServiceContext,
    pub saver: ModelSaver,
}

impl TestApp {
    /// Fresh storage, empty record store, in-memory cache.
    pub async fn new(config: &str) -> Self {
        let cache = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 }));
        Self::with_cache(config, cache).await
    }

    /// Same as [`new`](Self::new) with a custom cache backend.
    pub async fn with_cache(config: &str, cache: Arc<dyn CacheProvider>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(
            LocalStorageProvider::new(dir.path().join("media").to_str().unwrap())
                .await
                .unwrap(),
        );
        let records = Arc::new(ManifestRecordRepository::in_memory());
        let flaky = Arc::new(FlakyRecords::new(records.clone()));
        let renderer = Arc::new(CountingRenderer::default());
        let app_config = AppConfig::from_toml(config).unwrap();

        let ctx = ServiceContext::new(
            storage.clone(),
            flaky.clone(),
            renderer.clone(),
            cache.clone(),
            None,
            app_config.thumbnails.clone(),
        );
        let saver = ModelSaver::new(
            ctx.clone(),
            Arc::new(ModelRegistry::from_config(&app_config).unwrap()),
        );

        Self {
            _dir: dir,
            storage,
            records,
            flaky,
            renderer,
            cache,
            ctx,
            saver,
        }
    }

    /// A saver over the same collaborators with different field declarations.
    pub fn saver_for(&self, config: &str) -> ModelSaver {
        let app_config = AppConfig::from_toml(config).unwrap();
        ModelSaver::new(
            self.ctx.clone(),
            Arc::new(ModelRegistry::from_config(&app_config).unwrap()),
        )
    }

    pub fn admin(&self) -> ThumbnailAdmin {
        ThumbnailAdmin::new(self.saver.clone())
    }

    /// Root directory of the local storage provider.
    pub fn media_root(&self) -> PathBuf {
        self._dir.path().join("media")
    }

    pub async fn put_source(&self, path: &str, bytes: Bytes) {
        self.storage.write(path, bytes).await.unwrap();
    }

    /// Store a record directly, bypassing the save hooks.
    pub async fn insert(&self, id: u64, image: Option<&str>) -> ModelRecord {
        let mut record = ModelRecord::new(photo(), id);
        if let Some(path) = image {
            record.set_file("image", Some(path.to_string()));
        }
        self.records.save(&record, None).await.unwrap();
        record
    }

    pub async fn load(&self, id: u64) -> ModelRecord {
        self.records
            .find_by_id(&photo(), &RecordId::from(id))
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.storage.exists(path).await.unwrap()
    }

    pub fn render_calls(&self) -> usize {
        self.renderer.calls()
    }
}
