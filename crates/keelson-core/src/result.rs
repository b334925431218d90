//! Convenience result type alias for Keelson.

use crate::error::AppError;

/// A specialized `Result` type for Keelson operations.
pub type AppResult<T> = Result<T, AppError>;
