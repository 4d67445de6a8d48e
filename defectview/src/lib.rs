//! defectview - Zoomable, defect-preserving viewer core for defect maps
//!
//! Wafer inspection produces huge categorical images: flat backgrounds,
//! chip boundaries and isolated defect pixels whose exact colours matter.
//! This crate renders such images at any zoom level without letting
//! interpolation hide a defect or invent one.
//!
//! # Overview
//!
//! - [`RenderEngine`] - load an image, zoom, fit, describe the frame
//! - [`ScaleController`] - scale clamping, tier choice, render regime
//! - [`RenderSurface`] - where finished frames go
//! - [`resample`] - the algorithms (stretch, kernels, area, block defect)
//! - [`pyramid`] - the versioned background tier cache
//! - [`io`] - PNG/JPEG decoding into [`PixelBuffer`]
//!
//! # Example
//!
//! ```
//! use defectview::{FrameSurface, PixelBuffer, RenderEngine, RenderOptions};
//!
//! let options = RenderOptions::new().with_worker_threads(0);
//! let mut engine = RenderEngine::new(options, FrameSurface::new()).unwrap();
//!
//! let source = PixelBuffer::new_filled(400, 300, 0x808080ff).unwrap();
//! engine.load_image(&source).unwrap();
//! let applied = engine.set_scale(0.25);
//!
//! let info = engine.info();
//! assert_eq!(applied, 0.25);
//! assert_eq!((info.display_width, info.display_height), (100, 75));
//! assert_eq!(info.scale_percent, 25);
//! ```

mod controller;
mod engine;
mod error;
mod options;
mod surface;

pub use controller::{
    DEFAULT_FIT_MARGIN, FIFTH_TIER_MAX_SCALE, HALF_TIER_MAX_SCALE, RenderMode, ScaleController,
};
pub use engine::{RenderEngine, RenderInfo};
pub use error::{EngineError, EngineResult};
pub use options::{
    DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE, DEFAULT_WORKER_THREADS, INSPECTION_MAX_SCALE,
    RenderOptions,
};
pub use surface::{FrameSurface, NullSurface, RenderSurface};

// Re-export core types (pixel buffers and bitmaps are used everywhere)
pub use defectview_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use defectview_io as io;
pub use defectview_pyramid as pyramid;
pub use defectview_resample as resample;
