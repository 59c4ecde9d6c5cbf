//! # autothumb-service
//!
//! Thumbnail maintenance services for autothumb. The change detector and
//! the field save hooks keep a record's thumbnail in step with its source
//! image; the admin layer runs the same logic in bulk.
//!
//! Services follow constructor injection: collaborators are handed in
//! through a [`ServiceContext`] of `Arc` trait objects.

pub mod admin;
pub mod context;
pub mod model;
pub mod thumbnail;

pub use admin::{RegenerationDriver, Report, ThumbnailAdmin};
pub use context::ServiceContext;
pub use model::{ModelRegistry, ModelSaver};
pub use thumbnail::{ChangeDetector, ThumbnailField};
