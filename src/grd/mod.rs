//! GRD image decoder
//!
//! A GRD file is a 32-byte header followed by up to four independently
//! compressed planes. The pack type in the header selects one of three
//! pipelines per plane:
//!
//! - `0x01`: RLE
//! - `0xA1`: Huffman, then RLE
//! - `0xA2`: Huffman, then LZ77
//!
//! Decoded planes are interleaved into packed RGB or RGBA rows, top row
//! first.

mod header;
pub mod huffman;
pub mod lz77;
mod reader;
pub mod rle;

pub use header::GrdMetadata;
pub use huffman::{unpack_huffman, HuffmanTree, LsbBitReader};
pub use lz77::unpack_lz77;
pub use reader::GrdReader;
pub use rle::unpack_rle;

use crate::{DecodeStats, Result};
use std::borrow::Cow;
use std::path::Path;

/// Channel layout of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayout {
    /// Three bytes per pixel
    Rgb,
    /// Four bytes per pixel, alpha last
    Rgba,
}

/// A fully decoded image
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Header the image was decoded from
    pub metadata: GrdMetadata,
    /// Packed pixels, `bpp / 8` bytes each, top row first
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Image width
    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    /// Image height
    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    /// RGBA only when a 32-bit image actually carries an alpha plane
    pub fn color_layout(&self) -> ColorLayout {
        if self.metadata.has_alpha() {
            ColorLayout::Rgba
        } else {
            ColorLayout::Rgb
        }
    }

    /// Pixels in the layout reported by [`color_layout`](Self::color_layout)
    ///
    /// A 32-bit image without alpha has its unused fourth byte dropped.
    pub fn layout_pixels(&self) -> Cow<'_, [u8]> {
        if self.metadata.pixel_size() == 4 && !self.metadata.has_alpha() {
            Cow::Owned(
                self.pixels
                    .chunks_exact(4)
                    .flat_map(|px| px[..3].iter().copied())
                    .collect(),
            )
        } else {
            Cow::Borrowed(&self.pixels)
        }
    }
}

/// Decode a complete GRD file held in memory
pub fn decode_grd(data: &[u8]) -> Result<DecodedImage> {
    decode_grd_with_stats(data).map(|(image, _)| image)
}

/// Decode a complete GRD file, also returning decode statistics
pub fn decode_grd_with_stats(data: &[u8]) -> Result<(DecodedImage, DecodeStats)> {
    let info = GrdMetadata::parse(data, data.len() as u64)?;
    GrdReader::new(data, info).unpack()
}

/// Read and decode a GRD file
///
/// The file is read whole and closed before decoding starts.
pub fn read_grd_file<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let data = std::fs::read(path)?;
    decode_grd(&data)
}
