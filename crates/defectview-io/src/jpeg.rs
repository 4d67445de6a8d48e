//! JPEG image format support
//!
//! Reads JPEG images using the `jpeg-decoder` crate. Grayscale, RGB and
//! CMYK streams are expanded to opaque RGBA. Writing is not supported:
//! lossy output would alter defect colours.

use crate::{IoError, IoResult};
use defectview_core::{PixelBuffer, color};
use jpeg_decoder::{Decoder, PixelFormat};
use std::io::Read;

/// Read a JPEG image from a reader positioned at the SOI marker (`FF D8`).
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<PixelBuffer> {
    let mut decoder = Decoder::new(reader);
    let bytes = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing".to_string()))?;
    let width = u32::from(info.width);
    let height = u32::from(info.height);

    let data: Vec<u32> = match info.pixel_format {
        PixelFormat::L8 => bytes.iter().map(|&g| color::compose_rgb(g, g, g)).collect(),
        PixelFormat::L16 => bytes
            .chunks_exact(2)
            .map(|s| color::compose_rgb(s[0], s[0], s[0]))
            .collect(),
        PixelFormat::RGB24 => bytes
            .chunks_exact(3)
            .map(|s| color::compose_rgb(s[0], s[1], s[2]))
            .collect(),
        PixelFormat::CMYK32 => bytes
            .chunks_exact(4)
            .map(|s| {
                let k = u16::from(255 - s[3]);
                let ch = |c: u8| ((u16::from(255 - c) * k + 127) / 255) as u8;
                color::compose_rgb(ch(s[0]), ch(s[1]), ch(s[2]))
            })
            .collect(),
    };

    if data.len() != width as usize * height as usize {
        return Err(IoError::InvalidData(format!(
            "JPEG produced {} pixels for {}x{}",
            data.len(),
            width,
            height
        )));
    }
    Ok(PixelBuffer::from_pixels(width, height, data)?)
}
