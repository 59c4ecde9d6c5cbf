//! # autothumb-storage
//!
//! Storage provider implementations for autothumb (local filesystem) and the
//! thumbnail generator that turns source images into encoded thumbnails.

pub mod manager;
pub mod providers;
pub mod thumbnail;

pub use manager::StorageManager;
pub use thumbnail::ThumbnailGenerator;
