//! Error types for filter operations.

use thiserror::Error;

/// Error type for filter operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid buffer dimensions.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid filter parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for filter operations.
pub type OpsResult<T> = Result<T, OpsError>;

impl From<pxl_core::CoreError> for OpsError {
    fn from(err: pxl_core::CoreError) -> Self {
        match err {
            pxl_core::CoreError::InvalidDimensions(msg) => Self::InvalidDimensions(msg),
            pxl_core::CoreError::InvalidParameter(msg)
            | pxl_core::CoreError::UnsupportedFilter(msg) => Self::InvalidParameter(msg),
        }
    }
}
