//! Rectangular regions, clipping and blitting
//!
//! [`TileRect`] is the unsigned rectangle used for destination tiles and
//! source windows. `clip_rectangle` and `blit` move pixels between buffers.

use super::{PixelBuffer, PixelBufferMut};
use crate::error::{Error, Result};

/// Axis-aligned rectangle with unsigned origin and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub w: u32,
    /// Height
    pub h: u32,
}

impl TileRect {
    /// Create a rectangle.
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        TileRect { x, y, w, h }
    }

    /// Rectangle covering a full `width x height` raster.
    pub const fn full(width: u32, height: u32) -> Self {
        TileRect::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Check whether the rectangle has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &TileRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &TileRect) -> Option<TileRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(TileRect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Split a `width x height` raster into square tiles of edge `tile`.
    ///
    /// Tiles are emitted row-major; the last row/column is truncated to the
    /// raster edge so tiles never overlap and never leave gaps.
    pub fn grid(width: u32, height: u32, tile: u32) -> Vec<TileRect> {
        let tile = tile.max(1);
        let mut tiles = Vec::with_capacity((width.div_ceil(tile) * height.div_ceil(tile)) as usize);
        let mut y = 0;
        while y < height {
            let h = tile.min(height - y);
            let mut x = 0;
            while x < width {
                let w = tile.min(width - x);
                tiles.push(TileRect::new(x, y, w, h));
                x += w;
            }
            y += h;
        }
        tiles
    }
}

impl PixelBuffer {
    /// Extract a rectangular region into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the rectangle is empty or
    /// extends past the buffer edges.
    pub fn clip_rectangle(&self, rect: TileRect) -> Result<PixelBuffer> {
        if rect.is_empty() || !TileRect::full(self.width(), self.height()).contains(&rect) {
            return Err(Error::InvalidParameter(format!(
                "clip rectangle {rect:?} outside {}x{}",
                self.width(),
                self.height()
            )));
        }
        let mut data = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.bottom() {
            let row = self.row_data(y);
            data.extend_from_slice(&row[rect.x as usize..rect.right() as usize]);
        }
        PixelBuffer::from_pixels(rect.w, rect.h, data)
    }
}

impl PixelBufferMut {
    /// Copy all of `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `src` does not fit.
    pub fn blit(&mut self, src: &PixelBuffer, x: u32, y: u32) -> Result<()> {
        let target = TileRect::new(x, y, src.width(), src.height());
        if !TileRect::full(self.width(), self.height()).contains(&target) {
            return Err(Error::DimensionMismatch {
                expected: (self.width().saturating_sub(x), self.height().saturating_sub(y)),
                actual: (src.width(), src.height()),
            });
        }
        for sy in 0..src.height() {
            let src_row = src.row_data(sy);
            let dst_row = self.row_data_mut(y + sy);
            dst_row[x as usize..(x + src.width()) as usize].copy_from_slice(src_row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_pixels(w, h, (0..w * h).collect()).unwrap()
    }

    #[test]
    fn test_grid_covers_exactly_once() {
        let tiles = TileRect::grid(1234, 777, 500);
        assert_eq!(tiles.len(), 3 * 2);
        let covered: u64 = tiles.iter().map(|t| t.area()).sum();
        assert_eq!(covered, 1234 * 777);
        assert_eq!(tiles[2], TileRect::new(1000, 0, 234, 500));
        assert_eq!(tiles[5], TileRect::new(1000, 500, 234, 277));
        for (i, a) in tiles.iter().enumerate() {
            for b in &tiles[i + 1..] {
                assert!(a.intersect(b).is_none());
            }
        }
    }

    #[test]
    fn test_grid_small_raster() {
        assert_eq!(TileRect::grid(3, 2, 500), vec![TileRect::new(0, 0, 3, 2)]);
    }

    #[test]
    fn test_intersect() {
        let a = TileRect::new(0, 0, 10, 10);
        let b = TileRect::new(5, 8, 10, 10);
        assert_eq!(a.intersect(&b), Some(TileRect::new(5, 8, 5, 2)));
        assert_eq!(a.intersect(&TileRect::new(10, 0, 2, 2)), None);
    }

    #[test]
    fn test_clip_and_blit() {
        let src = numbered(5, 4);
        let piece = src.clip_rectangle(TileRect::new(1, 1, 3, 2)).unwrap();
        assert_eq!(piece.data(), &[6, 7, 8, 11, 12, 13]);

        let mut dst = PixelBufferMut::new(5, 4).unwrap();
        dst.blit(&piece, 1, 1).unwrap();
        assert_eq!(dst.get_pixel(3, 2), Some(13));
        assert_eq!(dst.get_pixel(0, 0), Some(0));
        assert!(dst.blit(&piece, 3, 3).is_err());
    }

    #[test]
    fn test_clip_rejects_outside() {
        let src = numbered(4, 4);
        assert!(src.clip_rectangle(TileRect::new(2, 2, 3, 1)).is_err());
        assert!(src.clip_rectangle(TileRect::new(0, 0, 0, 1)).is_err());
    }
}
