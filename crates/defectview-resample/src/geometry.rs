//! Source/destination geometry for a resampling job
//!
//! Destination pixel `x` covers the source interval `[x·rx, (x+1)·rx)`,
//! where `rx` is the number of source pixels per destination pixel. Every
//! algorithm and the tiled executor derive their source windows from these
//! intervals, so tiles agree with the whole-image path.

use crate::{ResampleError, ResampleResult};
use defectview_core::TileRect;

/// Destination length for a source length at `scale`: `max(1, floor(len·scale))`.
#[inline]
pub fn display_dimension(len: u32, scale: f64) -> u32 {
    let scaled = (f64::from(len) * scale).floor();
    if scaled < 1.0 {
        1
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Size relationship between a source raster and its resampled output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGeometry {
    /// Source width
    pub src_w: u32,
    /// Source height
    pub src_h: u32,
    /// Destination width
    pub dst_w: u32,
    /// Destination height
    pub dst_h: u32,
    /// Source pixels per destination pixel, horizontally
    pub ratio_x: f64,
    /// Source pixels per destination pixel, vertically
    pub ratio_y: f64,
}

impl ScaleGeometry {
    /// Geometry for scaling a `src_w x src_h` raster by `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidScaleFactor`] when `scale` is not a
    /// finite positive number, and [`ResampleError::InvalidParameters`] for
    /// an empty source.
    pub fn from_scale(src_w: u32, src_h: u32, scale: f64) -> ResampleResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ResampleError::InvalidScaleFactor(format!("{scale}")));
        }
        check_source(src_w, src_h)?;
        Ok(ScaleGeometry {
            src_w,
            src_h,
            dst_w: display_dimension(src_w, scale),
            dst_h: display_dimension(src_h, scale),
            ratio_x: 1.0 / scale,
            ratio_y: 1.0 / scale,
        })
    }

    /// Geometry mapping a `src_w x src_h` raster onto exactly `dst_w x dst_h`.
    pub fn to_size(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> ResampleResult<Self> {
        check_source(src_w, src_h)?;
        if dst_w == 0 || dst_h == 0 {
            return Err(ResampleError::InvalidParameters(format!(
                "destination size {dst_w}x{dst_h}"
            )));
        }
        Ok(ScaleGeometry {
            src_w,
            src_h,
            dst_w,
            dst_h,
            ratio_x: f64::from(src_w) / f64::from(dst_w),
            ratio_y: f64::from(src_h) / f64::from(dst_h),
        })
    }

    /// Horizontal scale actually applied (destination per source pixel).
    #[inline]
    pub fn effective_scale(&self) -> f64 {
        1.0 / self.ratio_x
    }

    /// The full destination raster.
    #[inline]
    pub fn dst_rect(&self) -> TileRect {
        TileRect::full(self.dst_w, self.dst_h)
    }

    /// Number of destination pixels.
    #[inline]
    pub fn dst_pixel_count(&self) -> u64 {
        u64::from(self.dst_w) * u64::from(self.dst_h)
    }

    /// Source columns `[lo, hi)` touched by destination columns `[x0, x1)`.
    pub fn source_span_x(&self, x0: u32, x1: u32) -> (u32, u32) {
        source_span(x0, x1, self.ratio_x, self.src_w)
    }

    /// Source rows `[lo, hi)` touched by destination rows `[y0, y1)`.
    pub fn source_span_y(&self, y0: u32, y1: u32) -> (u32, u32) {
        source_span(y0, y1, self.ratio_y, self.src_h)
    }

    /// Source window covered by a destination rectangle.
    ///
    /// Bounds use floor for the leading edge and ceil for the trailing edge,
    /// clipped to the source and never empty.
    pub fn source_window(&self, dst: TileRect) -> TileRect {
        let (x0, x1) = self.source_span_x(dst.x, dst.right());
        let (y0, y1) = self.source_span_y(dst.y, dst.bottom());
        TileRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

fn check_source(src_w: u32, src_h: u32) -> ResampleResult<()> {
    if src_w == 0 || src_h == 0 {
        return Err(ResampleError::InvalidParameters(format!(
            "empty source {src_w}x{src_h}"
        )));
    }
    Ok(())
}

/// `[floor(d0·ratio), ceil(d1·ratio))` clipped to `[0, limit)`, at least one wide.
#[inline]
pub(crate) fn source_span(d0: u32, d1: u32, ratio: f64, limit: u32) -> (u32, u32) {
    let lo = ((f64::from(d0) * ratio).floor() as u32).min(limit - 1);
    let hi = ((f64::from(d1) * ratio).ceil() as u32).min(limit);
    (lo, hi.max(lo + 1))
}
