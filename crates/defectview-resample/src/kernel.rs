//! Separable windowed-sinc resampling (Lanczos-2 and Lanczos-3)
//!
//! Weights are computed once per destination column and once per destination
//! row. When reducing, the kernel is stretched by the reduction ratio so that
//! every source pixel under the footprint contributes. Taps falling outside
//! the source are dropped and the remaining weights renormalised, so edges
//! neither darken nor brighten.
//!
//! The work is done in two passes over the source rows the destination
//! rectangle needs: a horizontal pass into an `f32` intermediate of
//! `rows × rect.w` pixels, then a vertical pass into the output. The
//! intermediate is bounded by the rectangle, which is what makes the tiled
//! executor useful for large sources.

use crate::ResampleResult;
use crate::geometry::ScaleGeometry;
use defectview_core::{PixelBuffer, PixelBufferMut, TileRect, color};
use std::f64::consts::PI;

/// Windowed-sinc kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Lanczos with two lobes: interactive reduction
    Lanczos2,
    /// Lanczos with three lobes: background tier quality
    Lanczos3,
}

impl Kernel {
    /// Half-width of the kernel in destination pixels.
    pub fn radius(self) -> f64 {
        match self {
            Kernel::Lanczos2 => 2.0,
            Kernel::Lanczos3 => 3.0,
        }
    }

    /// Kernel value at distance `d`.
    ///
    /// `k(0) = 1`, `k(d) = 0` for `|d| >= a`, otherwise
    /// `a·sin(πd)·sin(πd/a) / (π²d²)`.
    pub fn eval(self, d: f64) -> f64 {
        let a = self.radius();
        let d = d.abs();
        if d < 1e-12 {
            return 1.0;
        }
        if d >= a {
            return 0.0;
        }
        let pd = PI * d;
        a * pd.sin() * (pd / a).sin() / (pd * pd)
    }
}

/// Normalised taps for one destination index.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTaps {
    /// First source index
    pub start: u32,
    /// One weight per source index from `start`; sums to 1
    pub weights: Vec<f32>,
}

impl AxisTaps {
    /// One past the last source index.
    pub fn end(&self) -> u32 {
        self.start + self.weights.len() as u32
    }
}

/// Taps for destination index `d` along an axis with `ratio` source pixels
/// per destination pixel and `limit` source pixels.
pub fn axis_taps(kernel: Kernel, d: u32, ratio: f64, limit: u32) -> AxisTaps {
    let filter_scale = ratio.max(1.0);
    let support = kernel.radius() * filter_scale;
    let center = (f64::from(d) + 0.5) * ratio - 0.5;

    let lo = (center - support).ceil().max(0.0) as u32;
    let hi = ((center + support).floor() as i64).min(i64::from(limit) - 1);

    let mut start = lo;
    let mut raw: Vec<f64> = Vec::new();
    if hi >= i64::from(lo) {
        raw = (lo..=hi as u32)
            .map(|s| kernel.eval((f64::from(s) - center) / filter_scale))
            .collect();
        // trim zero taps at both ends
        let first = raw.iter().position(|&w| w != 0.0).unwrap_or(raw.len());
        let last = raw.iter().rposition(|&w| w != 0.0).map_or(first, |i| i + 1);
        raw = raw[first..last].to_vec();
        start = lo + first as u32;
    }

    let total: f64 = raw.iter().sum();
    if raw.is_empty() || total.abs() < 1e-9 {
        let nearest = (center.round().max(0.0) as u32).min(limit - 1);
        return AxisTaps {
            start: nearest,
            weights: vec![1.0],
        };
    }
    AxisTaps {
        start,
        weights: raw.iter().map(|&w| (w / total) as f32).collect(),
    }
}

fn taps_for(kernel: Kernel, d0: u32, d1: u32, ratio: f64, limit: u32) -> Vec<AxisTaps> {
    (d0..d1)
        .map(|d| axis_taps(kernel, d, ratio, limit))
        .collect()
}

/// Source window `[lo, hi)` read by a set of taps.
fn tap_span(taps: &[AxisTaps]) -> (u32, u32) {
    let lo = taps.iter().map(|t| t.start).min().unwrap_or(0);
    let hi = taps.iter().map(AxisTaps::end).max().unwrap_or(lo);
    (lo, hi)
}

/// Source rectangle a kernel reads for destination rectangle `rect`,
/// including the kernel support.
pub fn kernel_window(kernel: Kernel, geom: &ScaleGeometry, rect: TileRect) -> TileRect {
    let cols = taps_for(kernel, rect.x, rect.right(), geom.ratio_x, geom.src_w);
    let rows = taps_for(kernel, rect.y, rect.bottom(), geom.ratio_y, geom.src_h);
    let (x0, x1) = tap_span(&cols);
    let (y0, y1) = tap_span(&rows);
    TileRect::new(x0, y0, x1 - x0, y1 - y0)
}

/// Resample the destination rectangle `rect` with `kernel`.
pub fn kernel_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
    kernel: Kernel,
) -> ResampleResult<PixelBuffer> {
    let cols = taps_for(kernel, rect.x, rect.right(), geom.ratio_x, geom.src_w);
    let rows = taps_for(kernel, rect.y, rect.bottom(), geom.ratio_y, geom.src_h);
    let (y0, y1) = tap_span(&rows);

    // Horizontal pass: source rows [y0, y1) -> rect.w columns.
    let width = rect.w as usize;
    let mut tmp = vec![[0.0f32; 4]; (y1 - y0) as usize * width];
    for sy in y0..y1 {
        let src_row = src.row_data(sy);
        let tmp_row = &mut tmp[(sy - y0) as usize * width..][..width];
        for (acc, taps) in tmp_row.iter_mut().zip(&cols) {
            let mut sum = [0.0f32; 4];
            for (i, &w) in taps.weights.iter().enumerate() {
                let (r, g, b, a) = color::extract_rgba(src_row[taps.start as usize + i]);
                sum[0] += f32::from(r) * w;
                sum[1] += f32::from(g) * w;
                sum[2] += f32::from(b) * w;
                sum[3] += f32::from(a) * w;
            }
            *acc = sum;
        }
    }

    // Vertical pass.
    let mut out = PixelBufferMut::new(rect.w, rect.h)?;
    for (ty, taps) in rows.iter().enumerate() {
        let dst_row = out.row_data_mut(ty as u32);
        for (tx, d) in dst_row.iter_mut().enumerate() {
            let mut sum = [0.0f32; 4];
            for (i, &w) in taps.weights.iter().enumerate() {
                let row = (taps.start - y0) as usize + i;
                for (s, v) in sum.iter_mut().zip(tmp[row * width + tx]) {
                    *s += v * w;
                }
            }
            *d = color::compose_rgba(
                color::clamp_channel(sum[0]),
                color::clamp_channel(sum[1]),
                color::clamp_channel(sum[2]),
                color::clamp_channel(sum[3]),
            );
        }
    }
    Ok(out.into())
}

/// Lanczos-2 resampling of the whole image (interactive mid-range zoom).
pub fn weighted_kernel(src: &PixelBuffer, geom: &ScaleGeometry) -> ResampleResult<PixelBuffer> {
    kernel_region(src, geom, geom.dst_rect(), Kernel::Lanczos2)
}

/// Lanczos-2 resampling of a destination rectangle.
pub fn weighted_kernel_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
) -> ResampleResult<PixelBuffer> {
    kernel_region(src, geom, rect, Kernel::Lanczos2)
}

/// Lanczos-3 reduction of the whole image, used for background pyramid tiers.
pub fn smooth_reduce(src: &PixelBuffer, geom: &ScaleGeometry) -> ResampleResult<PixelBuffer> {
    kernel_region(src, geom, geom.dst_rect(), Kernel::Lanczos3)
}

/// Lanczos-3 reduction of a destination rectangle.
pub fn smooth_reduce_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
) -> ResampleResult<PixelBuffer> {
    kernel_region(src, geom, rect, Kernel::Lanczos3)
}
