//! Synthetic defect-map images
//!
//! Wafer inspection maps are large flat backgrounds split by a chip grid,
//! with isolated defect pixels. These builders produce the same structures
//! deterministically so tests need no image files.

use crate::error::{TestError, TestResult};
use defectview_core::{PixelBuffer, PixelBufferMut, color};

/// Mid-gray background used by the defect fixtures.
pub const BACKGROUND: u32 = 0x8080_80ff;
/// Strong red defect pixel.
pub const DEFECT_RED: u32 = 0xff00_00ff;
/// Blue chip grid line colour.
pub const GRID_LINE: u32 = 0x0000_ffff;

fn fixture_err(name: &str) -> impl FnOnce(defectview_core::Error) -> TestError + '_ {
    move |e| TestError::Fixture {
        name: name.to_string(),
        message: e.to_string(),
    }
}

/// Every pixel set to `pixel`.
pub fn uniform(width: u32, height: u32, pixel: u32) -> TestResult<PixelBuffer> {
    PixelBuffer::new_filled(width, height, pixel).map_err(fixture_err("uniform"))
}

/// Horizontal red ramp and vertical green ramp over a blue constant.
pub fn gradient(width: u32, height: u32) -> TestResult<PixelBuffer> {
    let mut m = PixelBufferMut::new(width, height).map_err(fixture_err("gradient"))?;
    let wd = width.saturating_sub(1).max(1);
    let hd = height.saturating_sub(1).max(1);
    for y in 0..height {
        let g = (y * 255 / hd) as u8;
        for x in 0..width {
            let r = (x * 255 / wd) as u8;
            m.set_pixel_unchecked(x, y, color::compose_rgb(r, g, 96));
        }
    }
    Ok(m.into())
}

/// Alternating `a`/`b` squares of edge `cell`.
pub fn checkerboard(width: u32, height: u32, cell: u32, a: u32, b: u32) -> TestResult<PixelBuffer> {
    let cell = cell.max(1);
    let mut m = PixelBufferMut::new(width, height).map_err(fixture_err("checkerboard"))?;
    for y in 0..height {
        for x in 0..width {
            let p = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            m.set_pixel_unchecked(x, y, p);
        }
    }
    Ok(m.into())
}

/// Gray background with single defect pixels at `dots`.
pub fn defect_dots(width: u32, height: u32, dots: &[(u32, u32, u32)]) -> TestResult<PixelBuffer> {
    let mut m = PixelBufferMut::new(width, height).map_err(fixture_err("defect_dots"))?;
    m.fill(BACKGROUND);
    for &(x, y, p) in dots {
        m.set_pixel(x, y, p).map_err(fixture_err("defect_dots"))?;
    }
    Ok(m.into())
}

/// Single red defect on a gray background.
pub fn defect_dot(width: u32, height: u32, x: u32, y: u32) -> TestResult<PixelBuffer> {
    defect_dots(width, height, &[(x, y, DEFECT_RED)])
}

/// Left part `left`, right part from column `split` on `right`.
pub fn two_color_edge(
    width: u32,
    height: u32,
    split: u32,
    left: u32,
    right: u32,
) -> TestResult<PixelBuffer> {
    let mut m = PixelBufferMut::new(width, height).map_err(fixture_err("two_color_edge"))?;
    for y in 0..height {
        let row = m.row_data_mut(y);
        for (x, p) in row.iter_mut().enumerate() {
            *p = if (x as u32) < split { left } else { right };
        }
    }
    Ok(m.into())
}

/// Chip map: gray dies separated by `line`-wide grid lines every `pitch`
/// pixels, with a sparse deterministic scatter of defects inside the dies.
pub fn chip_grid(width: u32, height: u32, pitch: u32, line: u32) -> TestResult<PixelBuffer> {
    let pitch = pitch.max(line + 1);
    let mut m = PixelBufferMut::new(width, height).map_err(fixture_err("chip_grid"))?;
    for y in 0..height {
        for x in 0..width {
            let on_line = x % pitch < line || y % pitch < line;
            let p = if on_line {
                GRID_LINE
            } else if scatter(x, y) % 997 == 0 {
                DEFECT_RED
            } else {
                BACKGROUND
            };
            m.set_pixel_unchecked(x, y, p);
        }
    }
    Ok(m.into())
}

/// Cheap integer hash for reproducible defect placement.
fn scatter(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(0x9e37_79b9) ^ y.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 15;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 13)
}
