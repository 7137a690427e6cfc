//! Common Result Type

use super::error::AppError;

/// Result type returned by request handlers and the services they call.
pub type AppResult<T> = Result<T, AppError>;
