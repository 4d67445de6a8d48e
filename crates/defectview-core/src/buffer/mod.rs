//! PixelBuffer - the RGBA raster every algorithm reads and writes
//!
//! # Pixel layout
//!
//! - One 32-bit word per pixel, row-major, no row padding
//! - Color order is RGBA with red in the MSB (`0xRRGGBBAA`)
//!
//! # Ownership model
//!
//! `PixelBuffer` uses `Arc` for efficient cloning (shared ownership), so a
//! source image handed to the engine and to background tier jobs is never
//! copied. To modify pixel data, convert to `PixelBufferMut` via
//! [`PixelBuffer::try_into_mut`] or [`PixelBuffer::to_mut`], then convert
//! back with `Into<PixelBuffer>`.

mod access;
mod region;

pub use region::TileRect;

use crate::color;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Internal buffer data
#[derive(Debug)]
struct BufferData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// The image data (one packed RGBA word per pixel)
    data: Vec<u32>,
}

impl BufferData {
    fn validate(width: u32, height: u32, len: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if len != expected {
            return Err(Error::DataLength {
                width,
                height,
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}

/// Fixed-size RGBA raster
///
/// # Examples
///
/// ```
/// use defectview_core::PixelBuffer;
///
/// let buf = PixelBuffer::new(640, 480).unwrap();
/// assert_eq!(buf.width(), 640);
/// assert_eq!(buf.height(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    inner: Arc<BufferData>,
}

impl PixelBuffer {
    /// Create a new buffer with every pixel set to transparent black.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_filled(width, height, 0)
    }

    /// Create a new buffer with every pixel set to `pixel`.
    pub fn new_filled(width: u32, height: u32, pixel: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let data = vec![pixel; width as usize * height as usize];
        Ok(PixelBuffer {
            inner: Arc::new(BufferData {
                width,
                height,
                data,
            }),
        })
    }

    /// Wrap an existing vector of packed RGBA words.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataLength`] if `data.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        BufferData::validate(width, height, data.len())?;
        Ok(PixelBuffer {
            inner: Arc::new(BufferData {
                width,
                height,
                data,
            }),
        })
    }

    /// Build a buffer from tightly packed R,G,B,A bytes.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(Error::InvalidParameter(format!(
                "RGBA byte length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        BufferData::validate(width, height, bytes.len() / 4)?;
        let data = bytes
            .chunks_exact(4)
            .map(|p| color::compose_rgba(p[0], p[1], p[2], p[3]))
            .collect();
        Self::from_pixels(width, height, data)
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.inner.width) * u64::from(self.inner.height)
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the number of strong references to this buffer.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check whether two buffers share the same pixel storage.
    #[inline]
    pub fn shares_storage(&self, other: &PixelBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get one row of pixels.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let start = y as usize * self.inner.width as usize;
        &self.inner.data[start..start + self.inner.width as usize]
    }

    /// Check if two buffers have the same width and height.
    pub fn sizes_equal(&self, other: &PixelBuffer) -> bool {
        self.inner.width == other.inner.width && self.inner.height == other.inner.height
    }

    /// Export the pixels as R,G,B,A bytes for display.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.inner.data.len() * 4);
        for &p in &self.inner.data {
            out.extend_from_slice(&p.to_be_bytes());
        }
        out
    }

    /// Create a deep copy of this buffer.
    ///
    /// Unlike `clone()` which shares data via Arc, this creates
    /// a completely independent copy.
    pub fn deep_clone(&self) -> Self {
        PixelBuffer {
            inner: Arc::new(BufferData {
                width: self.inner.width,
                height: self.inner.height,
                data: self.inner.data.clone(),
            }),
        }
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<PixelBufferMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(PixelBufferMut { inner: data }),
            Err(arc) => Err(PixelBuffer { inner: arc }),
        }
    }

    /// Create a mutable copy of this buffer.
    pub fn to_mut(&self) -> PixelBufferMut {
        PixelBufferMut {
            inner: BufferData {
                width: self.inner.width,
                height: self.inner.height,
                data: self.inner.data.clone(),
            },
        }
    }
}

impl PartialEq for PixelBuffer {
    /// Two buffers are equal when they have the same size and pixels.
    fn eq(&self, other: &Self) -> bool {
        self.shares_storage(other) || (self.sizes_equal(other) && self.data() == other.data())
    }
}

impl Eq for PixelBuffer {}

/// Mutable pixel buffer
///
/// Allows modification of image data. Convert back to an immutable
/// [`PixelBuffer`] using `Into<PixelBuffer>`.
#[derive(Debug)]
pub struct PixelBufferMut {
    inner: BufferData,
}

impl PixelBufferMut {
    /// Create a new mutable buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let buf = PixelBuffer::new(width, height)?;
        Ok(buf.to_mut())
    }

    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to the image data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Get mutable access to a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        let start = y as usize * self.inner.width as usize;
        let end = start + self.inner.width as usize;
        &mut self.inner.data[start..end]
    }

    /// Set every pixel to `pixel`.
    pub fn fill(&mut self, pixel: u32) {
        self.inner.data.fill(pixel);
    }
}

impl From<PixelBufferMut> for PixelBuffer {
    fn from(buf: PixelBufferMut) -> Self {
        PixelBuffer {
            inner: Arc::new(buf.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(matches!(
            PixelBuffer::new(0, 10),
            Err(Error::InvalidDimension {
                width: 0,
                height: 10
            })
        ));
        assert!(PixelBuffer::new(10, 0).is_err());
    }

    #[test]
    fn test_from_pixels_checks_length() {
        assert!(PixelBuffer::from_pixels(2, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            PixelBuffer::from_pixels(2, 2, vec![0; 3]),
            Err(Error::DataLength {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_rgba_bytes_roundtrip() {
        let bytes = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let buf = PixelBuffer::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(buf.get_rgba(1, 0), Some((50, 60, 70, 80)));
        assert_eq!(buf.to_rgba_bytes(), bytes);
    }

    #[test]
    fn test_from_rgba_bytes_odd_length() {
        assert!(PixelBuffer::from_rgba_bytes(1, 1, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_clone_shares_storage() {
        let buf = PixelBuffer::new(4, 4).unwrap();
        let shared = buf.clone();
        assert!(buf.shares_storage(&shared));
        assert_eq!(buf.ref_count(), 2);

        let copy = buf.deep_clone();
        assert!(!buf.shares_storage(&copy));
    }

    #[test]
    fn test_try_into_mut_requires_unique() {
        let buf = PixelBuffer::new(3, 3).unwrap();
        let other = buf.clone();
        let buf = buf.try_into_mut().unwrap_err();
        drop(other);
        let mut m = buf.try_into_mut().unwrap();
        m.fill(color::WHITE);
        let buf: PixelBuffer = m.into();
        assert!(buf.data().iter().all(|&p| p == color::WHITE));
    }

    #[test]
    fn test_row_data() {
        let data: Vec<u32> = (0..6).collect();
        let buf = PixelBuffer::from_pixels(3, 2, data).unwrap();
        assert_eq!(buf.row_data(1), &[3, 4, 5]);
    }
}
