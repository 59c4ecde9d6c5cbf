//! Model labels, record identifiers, and persisted records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Model identity in `app_label.ModelName` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelLabel {
    app_label: String,
    model_name: String,
}

impl ModelLabel {
    /// Parse `app_label.ModelName`.
    pub fn parse(label: &str) -> AppResult<Self> {
        match label.trim().split_once('.') {
            Some((app, model))
                if !app.is_empty() && !model.is_empty() && !model.contains('.') =>
            {
                Ok(Self {
                    app_label: app.to_string(),
                    model_name: model.to_string(),
                })
            }
            _ => Err(AppError::configuration(format!(
                "model must be given as \"app_label.ModelName\", got '{label}'"
            ))),
        }
    }

    /// Application label.
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// Model class name as declared.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Display for ModelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

impl TryFrom<String> for ModelLabel {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelLabel> for String {
    fn from(label: ModelLabel) -> Self {
        label.to_string()
    }
}

/// Primary key of a record within its model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// A persisted record with one or more file fields.
///
/// File fields hold storage paths; `None` or an empty string both mean
/// "no file". The thumbnail re-entrancy flag lives on the record itself so
/// that saves of different records never share state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model the record belongs to.
    pub model: ModelLabel,
    /// Primary key.
    pub id: RecordId,
    /// File field name → stored path.
    #[serde(default)]
    pub files: BTreeMap<String, Option<String>>,
    #[serde(skip)]
    generating_thumbnail: bool,
}

impl ModelRecord {
    /// Create a record with no file fields set.
    pub fn new(model: ModelLabel, id: impl Into<RecordId>) -> Self {
        Self {
            model,
            id: id.into(),
            files: BTreeMap::new(),
            generating_thumbnail: false,
        }
    }

    /// Builder-style file assignment.
    pub fn with_file(mut self, field: &str, path: impl Into<String>) -> Self {
        self.set_file(field, Some(path.into()));
        self
    }

    /// Stored path of a file field, treating empty strings as unset.
    pub fn file(&self, field: &str) -> Option<&str> {
        self.files
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Assign or clear a file field.
    pub fn set_file(&mut self, field: &str, path: Option<String>) {
        self.files.insert(field.to_string(), path);
    }

    /// Whether a thumbnail is currently being written for this record.
    pub fn is_generating_thumbnail(&self) -> bool {
        self.generating_thumbnail
    }

    /// Raise the re-entrancy flag. Returns `false` if it was already raised.
    pub fn begin_thumbnail_generation(&mut self) -> bool {
        if self.generating_thumbnail {
            return false;
        }
        self.generating_thumbnail = true;
        true
    }

    /// Lower the re-entrancy flag.
    pub fn finish_thumbnail_generation(&mut self) {
        self.generating_thumbnail = false;
    }
}
