//! Decoded bitmap capability
//!
//! The engine accepts any decoder output that can report its size and hand
//! out packed RGBA pixels. [`PixelBuffer`] satisfies the capability without
//! copying; other backends are converted once when loaded.

use crate::buffer::PixelBuffer;
use crate::color;
use crate::error::{Error, Result};

/// Read-only access to a decoded source image.
pub trait DecodedBitmap {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Packed `0xRRGGBBAA` pixel at (x, y).
    ///
    /// Only called with `x < width()` and `y < height()`.
    fn pixel(&self, x: u32, y: u32) -> u32;

    /// Produce a [`PixelBuffer`] holding this bitmap's pixels.
    ///
    /// The default implementation copies pixel by pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for zero-size bitmaps.
    fn to_pixel_buffer(&self) -> Result<PixelBuffer> {
        let (w, h) = (self.width(), self.height());
        if w == 0 || h == 0 {
            return Err(Error::InvalidDimension {
                width: w,
                height: h,
            });
        }
        let mut data = Vec::with_capacity(w as usize * h as usize);
        for y in 0..h {
            for x in 0..w {
                data.push(self.pixel(x, y));
            }
        }
        PixelBuffer::from_pixels(w, h, data)
    }
}

impl DecodedBitmap for PixelBuffer {
    fn width(&self) -> u32 {
        PixelBuffer::width(self)
    }

    fn height(&self) -> u32 {
        PixelBuffer::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.get_pixel_unchecked(x, y)
    }

    /// Shares the existing storage.
    fn to_pixel_buffer(&self) -> Result<PixelBuffer> {
        Ok(self.clone())
    }
}

/// Borrowed view over caller-owned, tightly packed R,G,B,A bytes.
///
/// Construction does not validate; the length check happens when the view
/// is converted, so malformed input surfaces as an error at load time.
#[derive(Debug, Clone, Copy)]
pub struct RgbaBitmap<'a> {
    width: u32,
    height: u32,
    bytes: &'a [u8],
}

impl<'a> RgbaBitmap<'a> {
    /// Wrap `bytes` as a `width x height` RGBA bitmap.
    pub fn new(width: u32, height: u32, bytes: &'a [u8]) -> Self {
        RgbaBitmap {
            width,
            height,
            bytes,
        }
    }

    /// The underlying bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl DecodedBitmap for RgbaBitmap<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        match self.bytes.get(i..i + 4) {
            Some(p) => color::compose_rgba(p[0], p[1], p[2], p[3]),
            None => 0,
        }
    }

    fn to_pixel_buffer(&self) -> Result<PixelBuffer> {
        PixelBuffer::from_rgba_bytes(self.width, self.height, self.bytes)
    }
}
