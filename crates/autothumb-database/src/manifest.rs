//! JSON manifest file holding every persisted record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use autothumb_core::error::{AppError, ErrorKind};
use autothumb_core::result::AppResult;
use autothumb_core::types::record::ModelRecord;

/// Current on-disk format version.
const MANIFEST_VERSION: u32 = 1;

/// Serialized manifest layout.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestDocument {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    records: Vec<ModelRecord>,
}

/// Handle on a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    /// Point at a manifest path. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the manifest.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty manifest.
    pub async fn load(&self) -> AppResult<Vec<ModelRecord>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Record manifest not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read record manifest: {}", self.path.display()),
                    e,
                ));
            }
        };

        let doc: ManifestDocument = serde_json::from_str(&text).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Malformed record manifest: {}", self.path.display()),
                e,
            )
        })?;
        if doc.version != MANIFEST_VERSION {
            return Err(AppError::configuration(format!(
                "Unsupported record manifest version {} (expected {MANIFEST_VERSION})",
                doc.version
            )));
        }

        debug!(path = %self.path.display(), records = doc.records.len(), "Loaded record manifest");
        Ok(doc.records)
    }

    /// Replace the manifest contents.
    ///
    /// Writes to a sibling temporary file first and renames it over the
    /// manifest so readers never observe a half-written file.
    pub async fn persist(&self, records: &[ModelRecord]) -> AppResult<()> {
        let doc = ManifestDocument {
            version: MANIFEST_VERSION,
            saved_at: Utc::now(),
            records: records.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace record manifest: {}", self.path.display()),
                e,
            )
        })?;

        debug!(path = %self.path.display(), records = records.len(), "Persisted record manifest");
        Ok(())
    }
}
