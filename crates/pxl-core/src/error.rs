//! Error types for core buffer and request validation.

use thiserror::Error;

/// Error type for buffer construction and request parsing.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid dimensions or buffer length.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Filter name not in the catalog.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Missing or out-of-range filter parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
