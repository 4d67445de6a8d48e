//! Error types for defectview-resample

use thiserror::Error;

/// Errors that can occur while resampling
#[derive(Debug, Error)]
pub enum ResampleError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] defectview_core::Error),

    /// Scale factor is not finite or not positive
    #[error("invalid scale factor: {0}")]
    InvalidScaleFactor(String),

    /// Invalid resampling parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for resample operations
pub type ResampleResult<T> = Result<T, ResampleError>;
