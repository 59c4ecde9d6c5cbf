//! Per-record thumbnail maintenance: change detection, cache access, and
//! the field save hooks.

pub mod cache;
pub mod descriptor;
pub mod detector;
pub mod field;

pub use cache::{StoredFieldConfig, ThumbnailCache};
pub use detector::{ChangeDetector, Decision, RegenerateReason};
pub use field::{Evaluation, FieldOutcome, RecordSaver, ThumbnailField, ThumbnailOutcome};
