//! Area-averaging reduction with exact sub-pixel coverage
//!
//! Destination pixel `(x, y)` averages the source rectangle
//! `[x·rx, (x+1)·rx) × [y·ry, (y+1)·ry)`. Every source pixel contributes in
//! proportion to the part of it inside the rectangle, so pixels straddling a
//! cell edge are split between the two cells instead of being counted twice
//! or dropped.

use crate::ResampleResult;
use crate::geometry::ScaleGeometry;
use defectview_core::{PixelBuffer, PixelBufferMut, TileRect, color};

/// Overlap of the interval `[start, end)` with each unit source cell.
///
/// Returns `(index, weight)` pairs for cells in `[0, limit)` with non-zero
/// overlap. The weights sum to the length of `[start, end)` clipped to
/// `[0, limit)`.
pub fn coverage(start: f64, end: f64, limit: u32) -> Vec<(u32, f64)> {
    let start = start.max(0.0);
    let end = end.min(f64::from(limit));
    if end <= start {
        return Vec::new();
    }
    let first = start.floor() as u32;
    let last = (end.ceil() as u32).min(limit);
    (first..last)
        .filter_map(|i| {
            let lo = f64::from(i).max(start);
            let hi = f64::from(i + 1).min(end);
            let w = hi - lo;
            (w > 0.0).then_some((i, w))
        })
        .collect()
}

/// Coverage for destination index `d`, falling back to the nearest source
/// cell when rounding leaves the interval empty.
fn cell_coverage(d: u32, ratio: f64, limit: u32) -> Vec<(u32, f64)> {
    let start = f64::from(d) * ratio;
    let cover = coverage(start, start + ratio, limit);
    if cover.is_empty() {
        let nearest = (start.floor() as u32).min(limit - 1);
        return vec![(nearest, 1.0)];
    }
    cover
}

/// Area-average the whole source to the destination size in `geom`.
pub fn area_average(src: &PixelBuffer, geom: &ScaleGeometry) -> ResampleResult<PixelBuffer> {
    area_average_region(src, geom, geom.dst_rect())
}

/// Area-average the destination rectangle `rect` into a new tile buffer.
pub fn area_average_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
) -> ResampleResult<PixelBuffer> {
    let cols: Vec<Vec<(u32, f64)>> = (rect.x..rect.right())
        .map(|x| cell_coverage(x, geom.ratio_x, geom.src_w))
        .collect();

    let mut out = PixelBufferMut::new(rect.w, rect.h)?;
    for (ty, dy) in (rect.y..rect.bottom()).enumerate() {
        let rows = cell_coverage(dy, geom.ratio_y, geom.src_h);
        for (tx, col) in cols.iter().enumerate() {
            let mut sum = [0.0f64; 4];
            let mut total = 0.0f64;
            for &(sy, wy) in &rows {
                let src_row = src.row_data(sy);
                for &(sx, wx) in col {
                    let w = wx * wy;
                    let (r, g, b, a) = color::extract_rgba(src_row[sx as usize]);
                    sum[0] += f64::from(r) * w;
                    sum[1] += f64::from(g) * w;
                    sum[2] += f64::from(b) * w;
                    sum[3] += f64::from(a) * w;
                    total += w;
                }
            }
            let avg = |c: f64| color::clamp_channel((c / total) as f32);
            let pixel = color::compose_rgba(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]));
            out.set_pixel_unchecked(tx as u32, ty as u32, pixel);
        }
    }
    Ok(out.into())
}
