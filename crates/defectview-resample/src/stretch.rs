//! Direct stretch copy (nearest source pixel, no interpolation)
//!
//! Each destination pixel takes the source pixel under its centre:
//! `sx = floor((x + 0.5) · ratio)`. At scale 1.0 this is the identity and
//! when zooming in every source pixel becomes a solid block, so defect
//! pixels are shown exactly as they are.

use crate::ResampleResult;
use crate::geometry::ScaleGeometry;
use defectview_core::{PixelBuffer, PixelBufferMut, TileRect};

/// Source index sampled by destination index `d`.
#[inline]
fn sample_index(d: u32, ratio: f64, limit: u32) -> u32 {
    (((f64::from(d) + 0.5) * ratio).floor() as u32).min(limit - 1)
}

/// Stretch-copy the whole source to the destination size in `geom`.
pub fn stretch(src: &PixelBuffer, geom: &ScaleGeometry) -> ResampleResult<PixelBuffer> {
    stretch_region(src, geom, geom.dst_rect())
}

/// Stretch-copy the destination rectangle `rect` into a new tile buffer.
pub fn stretch_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
) -> ResampleResult<PixelBuffer> {
    if geom.src_w == geom.dst_w && geom.src_h == geom.dst_h {
        if rect == geom.dst_rect() {
            return Ok(src.clone());
        }
        return Ok(src.clip_rectangle(rect)?);
    }

    let cols: Vec<usize> = (rect.x..rect.right())
        .map(|x| sample_index(x, geom.ratio_x, geom.src_w) as usize)
        .collect();

    let mut out = PixelBufferMut::new(rect.w, rect.h)?;
    for (ty, dy) in (rect.y..rect.bottom()).enumerate() {
        let sy = sample_index(dy, geom.ratio_y, geom.src_h);
        let src_row = src.row_data(sy);
        let dst_row = out.row_data_mut(ty as u32);
        for (d, &sx) in dst_row.iter_mut().zip(&cols) {
            *d = src_row[sx];
        }
    }
    Ok(out.into())
}
