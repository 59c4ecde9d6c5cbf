//! Convenience result type alias for autothumb.

use crate::error::AppError;

/// A specialized `Result` type for autothumb operations.
pub type AppResult<T> = Result<T, AppError>;
