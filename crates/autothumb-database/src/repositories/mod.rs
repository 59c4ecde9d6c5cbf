//! Repository implementations for autothumb records.

pub mod record;

pub use record::ManifestRecordRepository;
