//! Record store configuration.

use serde::{Deserialize, Serialize};

/// Where model records are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Path of the JSON manifest holding every record.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
        }
    }
}

fn default_manifest_path() -> String {
    "./data/records.json".to_string()
}
