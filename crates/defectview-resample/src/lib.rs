//! defectview-resample - Defect-preserving resampling for defect-map rasters
//!
//! This crate converts a full-resolution source raster into a displayed
//! raster at a requested scale:
//!
//! - Direct stretch copy (zoom in, and mild reduction)
//! - Separable Lanczos-2 / Lanczos-3 kernels (mid-range reduction, pyramid tiers)
//! - Exact area averaging
//! - Block defect analysis (extreme reduction without losing defects)
//! - Tiled execution for large sources
//!
//! Every algorithm has a region form that computes a destination
//! sub-rectangle in global coordinates; [`ChunkedExecutor`] stitches regions
//! into the same result the whole-image form produces.

pub mod area;
pub mod block;
pub mod chunked;
mod error;
pub mod geometry;
pub mod kernel;
pub mod method;
pub mod stretch;

pub use area::{area_average, area_average_region, coverage};
pub use block::{BlockClass, BlockDefectParams, block_defect, block_defect_region, is_defect};
pub use chunked::{ChunkedExecutor, DEFAULT_CHUNK_THRESHOLD_PIXELS, DEFAULT_TILE_SIZE};
pub use error::{ResampleError, ResampleResult};
pub use geometry::{ScaleGeometry, display_dimension};
pub use kernel::{
    Kernel, smooth_reduce, smooth_reduce_region, weighted_kernel, weighted_kernel_region,
};
pub use method::{ResampleMethod, Resampler};
pub use stretch::{stretch, stretch_region};
