//! Regeneration decision.

use std::fmt;

use serde::Serialize;

use autothumb_core::types::thumbnail::{CacheEntry, SourceImageDescriptor, ThumbnailConfig};

/// Why a thumbnail has to be produced again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerateReason {
    /// The field or caller forces regeneration.
    Forced,
    /// The record has no thumbnail yet.
    MissingThumbnail,
    /// Nothing is known about how the stored thumbnail was made.
    CacheMiss,
    /// Target size or resize mode changed since the last generation.
    ConfigChanged,
    /// Source name, size, or fingerprint changed.
    SourceChanged,
}

impl fmt::Display for RegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Forced => "forced",
            Self::MissingThumbnail => "missing thumbnail",
            Self::CacheMiss => "cache miss",
            Self::ConfigChanged => "configuration changed",
            Self::SourceChanged => "source changed",
        };
        f.write_str(s)
    }
}

/// Outcome of [`ChangeDetector::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum Decision {
    /// Produce the thumbnail.
    Regenerate(RegenerateReason),
    /// The stored thumbnail is current.
    Skip,
}

impl Decision {
    /// Whether the thumbnail has to be produced.
    pub fn is_regenerate(&self) -> bool {
        matches!(self, Self::Regenerate(_))
    }
}

/// Decides whether a stored thumbnail is stale.
///
/// Pure: reading and writing the cache is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Apply the rules in order; the first match wins.
    pub fn decide(
        current_source: &SourceImageDescriptor,
        config: &ThumbnailConfig,
        existing_thumbnail_present: bool,
        cached_entry: Option<&CacheEntry>,
    ) -> Decision {
        if config.force_regenerate() {
            return Decision::Regenerate(RegenerateReason::Forced);
        }
        if !existing_thumbnail_present {
            return Decision::Regenerate(RegenerateReason::MissingThumbnail);
        }
        let Some(entry) = cached_entry else {
            return Decision::Regenerate(RegenerateReason::CacheMiss);
        };
        if entry.value.size != config.target_size() || entry.value.mode != config.resize_mode() {
            return Decision::Regenerate(RegenerateReason::ConfigChanged);
        }
        if &entry.value.source != current_source {
            return Decision::Regenerate(RegenerateReason::SourceChanged);
        }
        Decision::Skip
    }

    /// Boolean form of [`decide`](Self::decide).
    pub fn should_regenerate(
        current_source: &SourceImageDescriptor,
        config: &ThumbnailConfig,
        existing_thumbnail_present: bool,
        cached_entry: Option<&CacheEntry>,
    ) -> bool {
        Self::decide(current_source, config, existing_thumbnail_present, cached_entry)
            .is_regenerate()
    }
}
