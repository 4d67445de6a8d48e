//! Tiled execution of a resampler over large rasters
//!
//! The destination is split into square tiles visited in row-major order.
//! Each tile is computed by the method's region function in global
//! destination coordinates and blitted at its offset, so the assembled
//! output equals the whole-image result while the working set per step is
//! one tile plus its source window.

use crate::ResampleResult;
use crate::geometry::ScaleGeometry;
use crate::method::Resampler;
use defectview_core::{PixelBuffer, PixelBufferMut, TileRect};
use log::{Level, debug, log_enabled, trace};

/// Default tile edge in destination pixels.
pub const DEFAULT_TILE_SIZE: u32 = 500;
/// Default source size above which tiling is used.
pub const DEFAULT_CHUNK_THRESHOLD_PIXELS: u64 = 4_000_000;

/// Splits a resampling job into destination tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedExecutor {
    /// Tile edge in destination pixels
    pub tile_size: u32,
    /// Source pixel count above which [`ChunkedExecutor::run`] tiles the job
    pub threshold_pixels: u64,
}

impl Default for ChunkedExecutor {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            threshold_pixels: DEFAULT_CHUNK_THRESHOLD_PIXELS,
        }
    }
}

impl ChunkedExecutor {
    /// Create an executor. A tile size of 0 is treated as 1.
    pub fn new(tile_size: u32, threshold_pixels: u64) -> Self {
        Self {
            tile_size: tile_size.max(1),
            threshold_pixels,
        }
    }

    /// Whether a source of `src_pixels` pixels should be processed in tiles.
    pub fn should_chunk(&self, src_pixels: u64) -> bool {
        src_pixels > self.threshold_pixels
    }

    /// Destination tiles for `geom`, row-major.
    pub fn tiles(&self, geom: &ScaleGeometry) -> Vec<TileRect> {
        TileRect::grid(geom.dst_w, geom.dst_h, self.tile_size.max(1))
    }

    /// Resample tile by tile into one destination buffer.
    pub fn execute(
        &self,
        src: &PixelBuffer,
        geom: &ScaleGeometry,
        resampler: &Resampler,
    ) -> ResampleResult<PixelBuffer> {
        let tiles = self.tiles(geom);
        debug!(
            "chunked {}: {}x{} -> {}x{} in {} tiles of {}",
            resampler.method,
            geom.src_w,
            geom.src_h,
            geom.dst_w,
            geom.dst_h,
            tiles.len(),
            self.tile_size
        );

        let mut out = PixelBufferMut::new(geom.dst_w, geom.dst_h)?;
        for rect in tiles {
            if log_enabled!(Level::Trace) {
                let window = resampler.source_window(geom, rect);
                trace!("tile {rect:?} reads source {window:?}");
            }
            let tile = resampler.resample_region(src, geom, rect)?;
            out.blit(&tile, rect.x, rect.y)?;
        }
        Ok(out.into())
    }

    /// Resample, tiling only when the source exceeds the threshold.
    pub fn run(
        &self,
        src: &PixelBuffer,
        geom: &ScaleGeometry,
        resampler: &Resampler,
    ) -> ResampleResult<PixelBuffer> {
        if self.should_chunk(src.pixel_count()) {
            self.execute(src, geom, resampler)
        } else {
            resampler.resample(src, geom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::ResampleMethod;

    #[test]
    fn test_should_chunk_threshold() {
        let ex = ChunkedExecutor::default();
        assert!(!ex.should_chunk(4_000_000));
        assert!(ex.should_chunk(4_000_001));
        assert!(ChunkedExecutor::new(10, 0).should_chunk(1));
    }

    #[test]
    fn test_tiles_cover_destination() {
        let ex = ChunkedExecutor::new(7, 0);
        let geom = ScaleGeometry::from_scale(50, 33, 0.5).unwrap();
        let tiles = ex.tiles(&geom);
        let area: u64 = tiles.iter().map(|t| t.area()).sum();
        assert_eq!(area, geom.dst_pixel_count());
        assert_eq!(tiles[0], TileRect::new(0, 0, 7, 7));
        let last = tiles.last().unwrap();
        assert_eq!(last.right(), geom.dst_w);
        assert_eq!(last.bottom(), geom.dst_h);
    }

    #[test]
    fn test_zero_tile_size_clamped() {
        assert_eq!(ChunkedExecutor::new(0, 10).tile_size, 1);
    }

    #[test]
    fn test_run_small_source_matches_execute() {
        let data = (0..30 * 20).map(|i| (i as u32).wrapping_mul(2_654_435_761) | 0xff).collect();
        let src = PixelBuffer::from_pixels(30, 20, data).unwrap();
        let geom = ScaleGeometry::from_scale(30, 20, 0.2).unwrap();
        let r = Resampler::new(ResampleMethod::BlockDefect);
        let whole = ChunkedExecutor::default().run(&src, &geom, &r).unwrap();
        let tiled = ChunkedExecutor::new(3, 0).run(&src, &geom, &r).unwrap();
        assert_eq!(whole, tiled);
    }
}
