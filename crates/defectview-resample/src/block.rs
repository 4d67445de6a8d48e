//! Block defect analysis for extreme reduction of defect maps
//!
//! Plain averaging at 1/5 scale and below dissolves single-pixel defects
//! into the background. This reducer scans each destination cell's source
//! block once and picks the output colour by priority:
//!
//! 1. **Boundary** - the mean diagonal difference `|ΔR|+|ΔG|+|ΔB|` between
//!    each pixel and its up-left neighbour exceeds the boundary threshold:
//!    the block straddles a chip grid line, drawn in the boundary colour.
//! 2. **Defect** - some pixel is strongly red, near-black or near-white:
//!    the last such pixel seen, brightened by the enhancement factor.
//! 3. **Background** - the rounded block average.

use crate::ResampleResult;
use crate::geometry::{ScaleGeometry, source_span};
use defectview_core::{PixelBuffer, PixelBufferMut, TileRect, color};

/// Red must exceed both green and blue by more than this to count as a defect.
pub const RED_DOMINANCE_MARGIN: i32 = 50;
/// `R+G+B` below this counts as a near-black defect.
pub const NEAR_BLACK_SUM: i32 = 50;
/// `R+G+B` above this counts as a near-white defect.
pub const NEAR_WHITE_SUM: i32 = 700;
/// Mean diagonal difference above which a block holds a structural boundary.
pub const DEFAULT_BOUNDARY_THRESHOLD: f32 = 100.0;
/// Default defect brightening factor.
pub const DEFAULT_DEFECT_ENHANCEMENT: f32 = 2.0;

/// Classify an RGB triple as a defect pixel.
#[inline]
pub fn is_defect(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let sum = r + g + b;
    (r > g + RED_DOMINANCE_MARGIN && r > b + RED_DOMINANCE_MARGIN)
        || sum < NEAR_BLACK_SUM
        || sum > NEAR_WHITE_SUM
}

#[inline]
fn diagonal_difference(p: u32, q: u32) -> u32 {
    let (r0, g0, b0) = color::extract_rgb(p);
    let (r1, g1, b1) = color::extract_rgb(q);
    u32::from(r0.abs_diff(r1)) + u32::from(g0.abs_diff(g1)) + u32::from(b0.abs_diff(b1))
}

/// Parameters of the block defect reducer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockDefectParams {
    /// Output colour for blocks containing a chip boundary
    pub boundary_color: u32,
    /// Multiplier applied to defect colours (result clamped to 255)
    pub enhancement: f32,
    /// Mean diagonal difference that marks a boundary
    pub boundary_threshold: f32,
}

impl Default for BlockDefectParams {
    fn default() -> Self {
        Self {
            boundary_color: color::compose_rgb(0, 255, 0),
            enhancement: DEFAULT_DEFECT_ENHANCEMENT,
            boundary_threshold: DEFAULT_BOUNDARY_THRESHOLD,
        }
    }
}

impl BlockDefectParams {
    /// Set the boundary colour.
    pub fn with_boundary_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.boundary_color = color::compose_rgb(r, g, b);
        self
    }

    /// Set the defect enhancement factor.
    pub fn with_enhancement(mut self, enhancement: f32) -> Self {
        self.enhancement = enhancement;
        self
    }
}

/// What a block analysis decided for one destination cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// Structural boundary inside the block
    Boundary,
    /// Defect pixel found (last seen)
    Defect(u32),
    /// Plain background: rounded average
    Average(u32),
}

/// Analyse the source block `[x0, x1) × [y0, y1)` in one pass.
pub fn classify_block(
    src: &PixelBuffer,
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
    params: &BlockDefectParams,
) -> BlockClass {
    let mut sum = [0u64; 4];
    let mut count = 0u64;
    let mut diff_sum = 0u64;
    let mut diff_pairs = 0u64;
    let mut defect = None;

    for sy in y0..y1 {
        let row = src.row_data(sy);
        let prev_row = (sy > y0).then(|| src.row_data(sy - 1));
        for sx in x0..x1 {
            let p = row[sx as usize];
            let (r, g, b, a) = color::extract_rgba(p);
            sum[0] += u64::from(r);
            sum[1] += u64::from(g);
            sum[2] += u64::from(b);
            sum[3] += u64::from(a);
            count += 1;

            if let Some(prev) = prev_row
                && sx > x0
            {
                diff_sum += u64::from(diagonal_difference(p, prev[sx as usize - 1]));
                diff_pairs += 1;
            }

            if is_defect(r, g, b) {
                defect = Some(p);
            }
        }
    }

    if diff_pairs > 0 && diff_sum as f32 / diff_pairs as f32 > params.boundary_threshold {
        return BlockClass::Boundary;
    }
    if let Some(p) = defect {
        return BlockClass::Defect(p);
    }
    let avg = |s: u64| ((s + count / 2) / count) as u8;
    BlockClass::Average(color::compose_rgba(
        avg(sum[0]),
        avg(sum[1]),
        avg(sum[2]),
        avg(sum[3]),
    ))
}

/// Reduce the whole source with block defect analysis.
pub fn block_defect(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    params: &BlockDefectParams,
) -> ResampleResult<PixelBuffer> {
    block_defect_region(src, geom, geom.dst_rect(), params)
}

/// Reduce the destination rectangle `rect` into a new tile buffer.
pub fn block_defect_region(
    src: &PixelBuffer,
    geom: &ScaleGeometry,
    rect: TileRect,
    params: &BlockDefectParams,
) -> ResampleResult<PixelBuffer> {
    let cols: Vec<(u32, u32)> = (rect.x..rect.right())
        .map(|x| source_span(x, x + 1, geom.ratio_x, geom.src_w))
        .collect();

    let mut out = PixelBufferMut::new(rect.w, rect.h)?;
    for (ty, dy) in (rect.y..rect.bottom()).enumerate() {
        let (y0, y1) = source_span(dy, dy + 1, geom.ratio_y, geom.src_h);
        for (tx, &(x0, x1)) in cols.iter().enumerate() {
            let pixel = match classify_block(src, x0, x1, y0, y1, params) {
                BlockClass::Boundary => params.boundary_color,
                BlockClass::Defect(p) => color::scale_rgb(p, params.enhancement),
                BlockClass::Average(p) => p,
            };
            out.set_pixel_unchecked(tx as u32, ty as u32, pixel);
        }
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: u32 = 0x8080_80ff;

    fn gray_with(w: u32, h: u32, marks: &[(u32, u32, u32)]) -> PixelBuffer {
        let mut m = PixelBufferMut::new(w, h).unwrap();
        m.fill(GRAY);
        for &(x, y, p) in marks {
            m.set_pixel(x, y, p).unwrap();
        }
        m.into()
    }

    #[test]
    fn test_defect_classifier() {
        assert!(is_defect(255, 0, 0));
        assert!(is_defect(200, 100, 100));
        assert!(!is_defect(150, 100, 100));
        assert!(is_defect(10, 10, 10));
        assert!(is_defect(240, 240, 240));
        assert!(!is_defect(128, 128, 128));
        assert!(!is_defect(0, 0, 255));
    }

    #[test]
    fn test_uniform_block_is_average() {
        let src = gray_with(10, 10, &[]);
        let class = classify_block(&src, 0, 5, 0, 5, &BlockDefectParams::default());
        assert_eq!(class, BlockClass::Average(GRAY));
    }

    #[test]
    fn test_single_defect_survives_reduction() {
        let red = color::compose_rgb(200, 20, 20);
        let src = gray_with(20, 20, &[(7, 12, red)]);
        let g = ScaleGeometry::from_scale(20, 20, 0.2).unwrap();
        let out = block_defect(&src, &g, &BlockDefectParams::default()).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
        // (7, 12) falls in cell (1, 2); enhanced x2 and clamped
        assert_eq!(out.get_rgb(1, 2), Some((255, 40, 40)));
        assert_eq!(out.get_pixel(0, 0), Some(GRAY));
        assert_eq!(out.get_pixel(3, 3), Some(GRAY));
    }

    #[test]
    fn test_last_seen_defect_wins() {
        let black = color::compose_rgb(5, 5, 5);
        let red = color::compose_rgb(255, 0, 0);
        let src = gray_with(5, 5, &[(0, 0, black), (4, 4, red)]);
        let class = classify_block(&src, 0, 5, 0, 5, &BlockDefectParams::default());
        assert_eq!(class, BlockClass::Defect(red));
    }

    #[test]
    fn test_boundary_beats_defect() {
        // Left half blue, right half yellow: every row crosses the edge.
        let blue = color::compose_rgb(0, 0, 255);
        let yellow = color::compose_rgb(255, 255, 0);
        let mut m = PixelBufferMut::new(4, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                m.set_pixel(x, y, if x < 2 { blue } else { yellow }).unwrap();
            }
        }
        m.set_rgb(3, 0, 255, 0, 0).unwrap();
        let src: PixelBuffer = m.into();
        let params = BlockDefectParams::default();
        assert_eq!(classify_block(&src, 0, 4, 0, 4, &params), BlockClass::Boundary);
    }

    #[test]
    fn test_boundary_threshold_respected() {
        // Two close grays: mean difference far below 100.
        let light = color::compose_rgb(140, 140, 140);
        let mut m = PixelBufferMut::new(4, 4).unwrap();
        m.fill(GRAY);
        for y in 0..4 {
            m.set_pixel(3, y, light).unwrap();
        }
        let src: PixelBuffer = m.into();
        let class = classify_block(&src, 0, 4, 0, 4, &BlockDefectParams::default());
        assert!(matches!(class, BlockClass::Average(_)));
    }

    #[test]
    fn test_custom_boundary_color() {
        let blue = color::compose_rgb(0, 0, 255);
        let yellow = color::compose_rgb(255, 255, 0);
        let data = (0..36)
            .map(|i| if i % 6 < 3 { blue } else { yellow })
            .collect();
        let src = PixelBuffer::from_pixels(6, 6, data).unwrap();
        let params = BlockDefectParams::default().with_boundary_color(255, 0, 255);
        let g = ScaleGeometry::to_size(6, 6, 1, 1).unwrap();
        let out = block_defect(&src, &g, &params).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_rgb(0, 0), Some((255, 0, 255)));
    }

    #[test]
    fn test_uneven_blocks_stay_in_bounds() {
        let src = gray_with(23, 17, &[(22, 16, color::compose_rgb(0, 0, 0))]);
        let g = ScaleGeometry::from_scale(23, 17, 0.29).unwrap();
        let out = block_defect(&src, &g, &BlockDefectParams::default()).unwrap();
        assert_eq!(out.dimensions(), (6, 4));
    }
}
