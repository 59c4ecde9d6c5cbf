//! # autothumb-core
//!
//! Core crate for autothumb. Contains the collaborator traits (storage,
//! cache, record repository, thumbnail renderer), configuration schemas,
//! thumbnail and record domain types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other autothumb crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
