//! Error types for defectview-pyramid

use crate::tier::TierKey;
use defectview_resample::ResampleError;
use thiserror::Error;

/// Errors that can occur while generating pyramid tiers
#[derive(Debug, Error)]
pub enum PyramidError {
    /// A background tier build failed; the tier goes back to absent
    #[error("tier {tier} generation failed: {reason}")]
    TierGenerationFailure { tier: TierKey, reason: String },

    /// Resampling error
    #[error("resample error: {0}")]
    Resample(#[from] ResampleError),

    /// The scheduler no longer accepts jobs
    #[error("scheduler closed")]
    SchedulerClosed,

    /// No source image has been loaded
    #[error("no source image loaded")]
    NoSource,
}

/// Result type for pyramid operations
pub type PyramidResult<T> = Result<T, PyramidError>;
