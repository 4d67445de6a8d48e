//! Error types for the render engine

use defectview_pyramid::PyramidError;
use defectview_resample::ResampleError;
use thiserror::Error;

/// Errors surfaced by [`RenderEngine`](crate::RenderEngine)
#[derive(Debug, Error)]
pub enum EngineError {
    /// The bitmap handed to `load_image` is empty or malformed
    #[error("invalid source image: {0}")]
    InvalidSource(String),

    /// Rejected engine configuration
    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    /// Resampling error
    #[error("resample error: {0}")]
    Resample(#[from] ResampleError),

    /// Pyramid error
    #[error("pyramid error: {0}")]
    Pyramid(#[from] PyramidError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
