//! defectview core - raster containers for the defect-map renderer
//!
//! This crate provides the data structures every other defectview crate
//! reads and writes:
//!
//! - [`PixelBuffer`] / [`PixelBufferMut`] - fixed-size RGBA raster (immutable / mutable)
//! - [`TileRect`] - destination sub-rectangle used by tiled resampling
//! - [`DecodedBitmap`] - read-only capability any decoder backend can satisfy
//! - [`RgbaBitmap`] - borrowed view over caller-owned RGBA bytes
//! - [`color`] - channel packing helpers for 32-bit pixels

pub mod bitmap;
pub mod buffer;
pub mod error;

pub use bitmap::{DecodedBitmap, RgbaBitmap};
pub use buffer::{PixelBuffer, PixelBufferMut, TileRect};
pub use error::{Error, Result};

/// Color channel indices and helper functions for 32-bit RGBA pixels.
///
/// # Pixel format
///
/// 32-bit pixels are stored as `0xRRGGBBAA` (red in MSB, alpha in LSB).
pub mod color {
    /// Red channel (MSB, byte 0)
    pub const RED: usize = 0;
    /// Green channel (byte 1)
    pub const GREEN: usize = 1;
    /// Blue channel (byte 2)
    pub const BLUE: usize = 2;
    /// Alpha channel (LSB, byte 3)
    pub const ALPHA: usize = 3;

    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// Opaque black.
    pub const BLACK: u32 = 0x0000_00ff;
    /// Opaque white.
    pub const WHITE: u32 = 0xffff_ffff;

    /// Extract red component from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & 0xff) as u8
    }

    /// Extract green component from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & 0xff) as u8
    }

    /// Extract blue component from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & 0xff) as u8
    }

    /// Extract alpha component from a 32-bit pixel.
    #[inline]
    pub fn alpha(pixel: u32) -> u8 {
        ((pixel >> ALPHA_SHIFT) & 0xff) as u8
    }

    /// Compose a 32-bit RGB pixel (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | (255 << ALPHA_SHIFT)
    }

    /// Compose a 32-bit RGBA pixel.
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((a as u32) << ALPHA_SHIFT)
    }

    /// Extract RGB values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel))
    }

    /// Extract RGBA values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgba(pixel: u32) -> (u8, u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel), alpha(pixel))
    }

    /// Multiply the RGB channels by `factor`, clamping each to 255.
    ///
    /// The result is opaque regardless of the input alpha.
    #[inline]
    pub fn scale_rgb(pixel: u32, factor: f32) -> u32 {
        let boost = |v: u8| (v as f32 * factor).round().clamp(0.0, 255.0) as u8;
        let (r, g, b) = extract_rgb(pixel);
        compose_rgb(boost(r), boost(g), boost(b))
    }

    /// Clamp and round a floating-point channel value into `0..=255`.
    #[inline]
    pub fn clamp_channel(v: f32) -> u8 {
        if v.is_nan() {
            return 0;
        }
        v.round().clamp(0.0, 255.0) as u8
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_compose_extract() {
            let p = compose_rgba(1, 2, 3, 4);
            assert_eq!(p, 0x0102_0304);
            assert_eq!(extract_rgba(p), (1, 2, 3, 4));
            assert_eq!(compose_rgb(255, 0, 0), 0xff00_00ff);
        }

        #[test]
        fn test_scale_rgb_clamps() {
            let p = scale_rgb(compose_rgb(200, 60, 10), 2.0);
            assert_eq!(extract_rgba(p), (255, 120, 20, 255));
        }

        #[test]
        fn test_scale_rgb_forces_opaque() {
            let p = scale_rgb(compose_rgba(10, 10, 10, 0), 1.0);
            assert_eq!(alpha(p), 255);
        }

        #[test]
        fn test_clamp_channel() {
            assert_eq!(clamp_channel(-3.0), 0);
            assert_eq!(clamp_channel(254.6), 255);
            assert_eq!(clamp_channel(300.0), 255);
            assert_eq!(clamp_channel(f32::NAN), 0);
        }
    }
}
