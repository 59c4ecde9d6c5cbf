//! Domain types shared across autothumb crates.

pub mod record;
pub mod thumbnail;

pub use record::{ModelLabel, ModelRecord, RecordId};
pub use thumbnail::{
    CacheEntry, CachedThumbnailState, OutputFormat, ResizeMode, SourceImageDescriptor,
    ThumbnailArtifact, ThumbnailConfig, ThumbnailSize,
};
