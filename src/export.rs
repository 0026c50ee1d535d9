//! PNG export of decoded images

use crate::grd::{ColorLayout, DecodedImage};
use crate::{GrdPacError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

impl From<png::EncodingError> for GrdPacError {
    fn from(e: png::EncodingError) -> Self {
        match e {
            png::EncodingError::IoError(io) => GrdPacError::Io(io),
            other => GrdPacError::Encode(other.to_string()),
        }
    }
}

/// Encode `image` as an 8-bit PNG into `writer`
pub fn write_png<W: Write>(writer: W, image: &DecodedImage) -> Result<()> {
    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(match image.color_layout() {
        ColorLayout::Rgb => png::ColorType::Rgb,
        ColorLayout::Rgba => png::ColorType::Rgba,
    });
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.layout_pixels())?;
    writer.finish()?;
    Ok(())
}

/// Write `image` to a PNG file at `path`
pub fn save_png<P: AsRef<Path>>(path: P, image: &DecodedImage) -> Result<()> {
    let file = File::create(path)?;
    write_png(BufWriter::new(file), image)
}
