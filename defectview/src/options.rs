//! Engine configuration

use crate::error::{EngineError, EngineResult};
use defectview_pyramid::DEFAULT_PLACEHOLDER_INTERVAL;
use defectview_resample::block::DEFAULT_DEFECT_ENHANCEMENT;
use defectview_resample::{
    BlockDefectParams, ChunkedExecutor, DEFAULT_CHUNK_THRESHOLD_PIXELS, DEFAULT_TILE_SIZE,
};
use std::time::Duration;

/// Default lower scale bound.
pub const DEFAULT_MIN_SCALE: f64 = 0.05;
/// Default upper scale bound.
pub const DEFAULT_MAX_SCALE: f64 = 5.0;
/// Upper scale bound for close inspection.
pub const INSPECTION_MAX_SCALE: f64 = 10.0;
/// Default number of background tier workers.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Options for a [`RenderEngine`](crate::RenderEngine)
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Smallest applied scale (default: 0.05)
    pub min_scale: f64,

    /// Largest applied scale (default: 5.0)
    pub max_scale: f64,

    /// Build and render from reduced tiers (default: true)
    pub use_pyramid: bool,

    /// Colour marking chip boundaries in block analysis (default: green)
    pub chip_boundary_color: (u8, u8, u8),

    /// Defect colour multiplier in block analysis (default: 2.0)
    pub defect_enhancement: f32,

    /// Use block defect analysis for extreme reductions (default: true)
    /// When off, area averaging is used instead.
    pub enhance_defects: bool,

    /// Source size above which rendering is tiled (default: 4 000 000 pixels)
    pub chunk_threshold_pixels: u64,

    /// Tile edge for tiled rendering (default: 500)
    pub chunk_tile_size: u32,

    /// Minimum time between synchronous placeholder builds (default: 50 ms)
    pub placeholder_interval: Duration,

    /// Background tier workers; 0 builds tiers inline (default: 2)
    pub worker_threads: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            use_pyramid: true,
            chip_boundary_color: (0, 255, 0),
            defect_enhancement: DEFAULT_DEFECT_ENHANCEMENT,
            enhance_defects: true,
            chunk_threshold_pixels: DEFAULT_CHUNK_THRESHOLD_PIXELS,
            chunk_tile_size: DEFAULT_TILE_SIZE,
            placeholder_interval: DEFAULT_PLACEHOLDER_INTERVAL,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl RenderOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the zoom range widened for close inspection
    pub fn inspection() -> Self {
        Self::default().with_scale_range(DEFAULT_MIN_SCALE, INSPECTION_MAX_SCALE)
    }

    /// Set the scale bounds
    pub fn with_scale_range(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    /// Enable or disable the tier pyramid
    pub fn with_pyramid(mut self, use_pyramid: bool) -> Self {
        self.use_pyramid = use_pyramid;
        self
    }

    /// Set the chip boundary colour
    pub fn with_boundary_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.chip_boundary_color = (r, g, b);
        self
    }

    /// Set the defect enhancement factor
    pub fn with_defect_enhancement(mut self, factor: f32) -> Self {
        self.defect_enhancement = factor;
        self
    }

    /// Enable or disable block defect analysis
    pub fn with_enhance_defects(mut self, enhance: bool) -> Self {
        self.enhance_defects = enhance;
        self
    }

    /// Set the tiling threshold and tile size
    pub fn with_chunking(mut self, threshold_pixels: u64, tile_size: u32) -> Self {
        self.chunk_threshold_pixels = threshold_pixels;
        self.chunk_tile_size = tile_size;
        self
    }

    /// Set the placeholder throttle interval
    pub fn with_placeholder_interval(mut self, interval: Duration) -> Self {
        self.placeholder_interval = interval;
        self
    }

    /// Set the number of background workers
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Validate options
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(EngineError::InvalidOptions(
                "min_scale must be positive".to_string(),
            ));
        }
        if !self.max_scale.is_finite() || self.min_scale > self.max_scale {
            return Err(EngineError::InvalidOptions(
                "max_scale must be finite and not below min_scale".to_string(),
            ));
        }
        if !(self.defect_enhancement.is_finite() && self.defect_enhancement > 0.0) {
            return Err(EngineError::InvalidOptions(
                "defect_enhancement must be positive".to_string(),
            ));
        }
        if self.chunk_tile_size == 0 {
            return Err(EngineError::InvalidOptions(
                "chunk_tile_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Block analysis parameters derived from these options.
    pub fn block_params(&self) -> BlockDefectParams {
        let (r, g, b) = self.chip_boundary_color;
        BlockDefectParams::default()
            .with_boundary_color(r, g, b)
            .with_enhancement(self.defect_enhancement)
    }

    /// Tiled executor derived from these options.
    pub fn executor(&self) -> ChunkedExecutor {
        ChunkedExecutor::new(self.chunk_tile_size, self.chunk_threshold_pixels)
    }
}
