//! Collaborator traits defined in `autothumb-core` and implemented by other crates.

pub mod cache;
pub mod renderer;
pub mod repository;
pub mod storage;

pub use cache::CacheProvider;
pub use renderer::ThumbnailRenderer;
pub use repository::RecordRepository;
pub use storage::StorageProvider;
