//! # autothumb-database
//!
//! Record persistence for autothumb: a JSON manifest file on disk and the
//! [`RecordRepository`](autothumb_core::traits::repository::RecordRepository)
//! implementation built on it.

pub mod manifest;
pub mod repositories;

pub use manifest::ManifestFile;
pub use repositories::ManifestRecordRepository;
