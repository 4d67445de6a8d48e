//! Pixel access functions
//!
//! Bounds-checked and unchecked getters/setters for single pixels.

use super::{PixelBuffer, PixelBufferMut};
use crate::color;
use crate::error::{Error, Result};

impl PixelBuffer {
    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without bounds checking against the row width.
    ///
    /// # Panics
    ///
    /// Panics if the computed index is outside the data slice.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        self.data()[y as usize * self.width() as usize + x as usize]
    }

    /// Get RGB values at (x, y).
    pub fn get_rgb(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        self.get_pixel(x, y).map(color::extract_rgb)
    }

    /// Get RGBA values at (x, y).
    pub fn get_rgba(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        self.get_pixel(x, y).map(color::extract_rgba)
    }
}

impl PixelBufferMut {
    /// Get a pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without bounds checking against the row width.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        self.data()[y as usize * self.width() as usize + x as usize]
    }

    /// Set a pixel value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        if x >= self.width() {
            return Err(Error::IndexOutOfBounds {
                index: x as usize,
                len: self.width() as usize,
            });
        }
        if y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                index: y as usize,
                len: self.height() as usize,
            });
        }
        self.set_pixel_unchecked(x, y, val);
        Ok(())
    }

    /// Set a pixel value without bounds checking against the row width.
    ///
    /// # Panics
    ///
    /// Panics if the computed index is outside the data slice.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, val: u32) {
        let idx = y as usize * self.width() as usize + x as usize;
        self.data_mut()[idx] = val;
    }

    /// Set an opaque RGB pixel at (x, y).
    pub fn set_rgb(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        self.set_pixel(x, y, color::compose_rgb(r, g, b))
    }

    /// Set an RGBA pixel at (x, y).
    pub fn set_rgba(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) -> Result<()> {
        self.set_pixel(x, y, color::compose_rgba(r, g, b, a))
    }
}
