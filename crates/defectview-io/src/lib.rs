//! defectview-io - Image decoding for defectview
//!
//! Decodes PNG and JPEG files into [`PixelBuffer`]s the engine can load and
//! writes PNG for regression output. Format support is controlled by
//! features (`png-format`, `jpeg`), both on by default.

mod error;
pub mod format;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;

pub use error::{IoError, IoResult};
pub use format::{ImageFormat, detect_format, detect_format_from_bytes};

use defectview_core::PixelBuffer;
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

/// Read an image from a file, detecting the format from its header.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let file = File::open(path)?;
    let pix = read_image_format(BufReader::new(file), format)?;
    debug!(
        "read {} ({:?}, {}x{})",
        path.display(),
        format,
        pix.width(),
        pix.height()
    );
    Ok(pix)
}

/// Read an image from an in-memory encoded buffer.
pub fn read_image_mem(data: &[u8]) -> IoResult<PixelBuffer> {
    let format = detect_format_from_bytes(data)?;
    read_image_format(Cursor::new(data), format)
}

#[allow(unused_variables)]
fn read_image_format<R: std::io::BufRead + std::io::Seek>(
    reader: R,
    format: ImageFormat,
) -> IoResult<PixelBuffer> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(reader),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg(reader),
        other => Err(IoError::UnsupportedFormat(format!("{:?}", other))),
    }
}

/// Write an image to a file.
///
/// Only PNG output is supported.
pub fn write_image<P: AsRef<Path>>(
    pix: &PixelBuffer,
    path: P,
    format: ImageFormat,
) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    write_image_to(pix, BufWriter::new(file), format)
}

/// Encode an image into a byte vector.
pub fn write_image_mem(pix: &PixelBuffer, format: ImageFormat) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    write_image_to(pix, &mut out, format)?;
    Ok(out)
}

#[allow(unused_variables)]
fn write_image_to<W: std::io::Write>(
    pix: &PixelBuffer,
    writer: W,
    format: ImageFormat,
) -> IoResult<()> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::write_png(pix, writer),
        other => Err(IoError::UnsupportedFormat(format!(
            "writing {:?} is not supported",
            other
        ))),
    }
}
