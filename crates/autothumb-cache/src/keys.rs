//! Cache key builders for thumbnail change detection.
//!
//! Every key starts with `thumb:{model}:` so that one model's entries can be
//! cleared with a single prefix pattern.

use autothumb_core::types::record::{ModelLabel, RecordId};

/// Prefix applied to all thumbnail cache keys.
const PREFIX: &str = "thumb";

/// Key for the state that produced a record's stored thumbnail.
pub fn record_thumbnail(model: &ModelLabel, record_id: &RecordId, field: &str) -> String {
    format!("{PREFIX}:{model}:rec:{field}:{record_id}")
}

/// Key for the size and mode a field was last generated with.
pub fn field_config(model: &ModelLabel, field: &str) -> String {
    format!("{PREFIX}:{model}:config:{field}")
}

/// Pattern matching every per-record entry of one field.
pub fn field_records_pattern(model: &ModelLabel, field: &str) -> String {
    format!("{PREFIX}:{model}:rec:{field}:*")
}

/// Pattern matching every entry of a model.
pub fn model_pattern(model: &ModelLabel) -> String {
    format!("{PREFIX}:{model}:*")
}

/// Pattern matching every thumbnail entry.
pub fn all_pattern() -> String {
    format!("{PREFIX}:*")
}
