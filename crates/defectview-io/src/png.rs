//! PNG image format support
//!
//! Every PNG colour type is normalised to 8-bit samples on read and
//! expanded into packed RGBA. Writes are always 8-bit RGBA so defect
//! colours survive a round trip unchanged.

use crate::{IoError, IoResult};
use defectview_core::{PixelBuffer, PixelBufferMut, color};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<PixelBuffer> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let width = output_info.width;
    let height = output_info.height;
    if output_info.bit_depth != BitDepth::Eight {
        return Err(IoError::UnsupportedFormat(format!(
            "unexpected PNG bit depth after normalisation: {:?}",
            output_info.bit_depth
        )));
    }
    let samples = match output_info.color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNG color type: {:?}",
                other
            )));
        }
    };

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];
    let mut pix = PixelBufferMut::new(width, height)?;

    for y in 0..height {
        let row = &data[y as usize * bytes_per_row..][..width as usize * samples];
        for (x, s) in row.chunks_exact(samples).enumerate() {
            let pixel = match samples {
                1 => color::compose_rgb(s[0], s[0], s[0]),
                2 => color::compose_rgba(s[0], s[0], s[0], s[1]),
                3 => color::compose_rgb(s[0], s[1], s[2]),
                _ => color::compose_rgba(s[0], s[1], s[2], s[3]),
            };
            pix.set_pixel_unchecked(x as u32, y, pixel);
        }
    }

    Ok(pix.into())
}

/// Write a PNG image as 8-bit RGBA
pub fn write_png<W: Write>(pix: &PixelBuffer, writer: W) -> IoResult<()> {
    let mut encoder = Encoder::new(writer, pix.width(), pix.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;
    writer
        .write_image_data(&pix.to_rgba_bytes())
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;
    writer
        .finish()
        .map_err(|e| IoError::EncodeError(format!("PNG finish error: {}", e)))?;
    Ok(())
}
