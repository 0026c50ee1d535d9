//! GRD header parsing
//!
//! The 32-byte header (little-endian):
//!
//! | offset | type   | field                                   |
//! |--------|--------|-----------------------------------------|
//! | 0x00   | u8     | pack family (1 or 2)                    |
//! | 0x01   | u8     | pack type (0x01, 0xA1, 0xA2)            |
//! | 0x02   | u16    | screen width                            |
//! | 0x04   | u16    | screen height                           |
//! | 0x06   | u16    | bits per pixel (24 or 32)               |
//! | 0x08   | u16 x4 | left, right, top, bottom                |
//! | 0x10   | u32 x4 | alpha, red, green, blue plane sizes     |
//!
//! Width and height are not stored; they come from the bounding box.

use crate::view::ArcView;
use crate::{
    GrdPacError, PackType, Result, GRD_HEADER_SIZE, MAX_UNPACKED_SIZE, PACK_TYPE_HUFFMAN_LZ77,
    PACK_TYPE_HUFFMAN_RLE, PACK_TYPE_RLE,
};
use std::io::{Read, Seek};

/// Parsed and validated GRD header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrdMetadata {
    /// Raw format code; the high byte is the pack type
    pub format: u16,
    /// Width of the screen the image is placed on
    pub screen_width: u16,
    /// Height of the screen the image is placed on
    pub screen_height: u16,
    /// Image width, `|right - left|`
    pub width: u32,
    /// Image height, `|bottom - top|`
    pub height: u32,
    /// 24 or 32
    pub bpp: u16,
    /// Horizontal placement, the left edge
    pub offset_x: i32,
    /// Vertical placement from the bottom edge, `screen_height - bottom`
    pub offset_y: i32,
    /// Compressed alpha plane size
    pub alpha_size: u32,
    /// Compressed red plane size
    pub red_size: u32,
    /// Compressed green plane size
    pub green_size: u32,
    /// Compressed blue plane size
    pub blue_size: u32,
}

fn u16_at(header: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([header[at], header[at + 1]])
}

fn u32_at(header: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
}

impl GrdMetadata {
    /// Parse a header and check it against the total file length
    pub fn parse(header: &[u8], file_len: u64) -> Result<Self> {
        if header.len() < GRD_HEADER_SIZE {
            return Err(GrdPacError::FormatRejected(format!(
                "{} bytes is too short for a GRD header",
                header.len()
            )));
        }
        if !matches!(header[0], 1 | 2) {
            return Err(GrdPacError::FormatRejected(format!(
                "bad pack family {:#04x}",
                header[0]
            )));
        }
        if !matches!(
            header[1],
            PACK_TYPE_RLE | PACK_TYPE_HUFFMAN_RLE | PACK_TYPE_HUFFMAN_LZ77
        ) {
            return Err(GrdPacError::FormatRejected(format!(
                "bad pack type {:#04x}",
                header[1]
            )));
        }
        let bpp = u16_at(header, 6);
        if bpp != 24 && bpp != 32 {
            return Err(GrdPacError::FormatRejected(format!("unsupported bpp {bpp}")));
        }

        let screen_width = u16_at(header, 2);
        let screen_height = u16_at(header, 4);
        let left = u16_at(header, 8);
        let right = u16_at(header, 10);
        let top = u16_at(header, 12);
        let bottom = u16_at(header, 14);

        let meta = GrdMetadata {
            format: u16_at(header, 0),
            screen_width,
            screen_height,
            width: right.abs_diff(left) as u32,
            height: bottom.abs_diff(top) as u32,
            bpp,
            offset_x: left as i32,
            offset_y: screen_height as i32 - bottom as i32,
            alpha_size: u32_at(header, 0x10),
            red_size: u32_at(header, 0x14),
            green_size: u32_at(header, 0x18),
            blue_size: u32_at(header, 0x1C),
        };

        let expected = meta.declared_len();
        if expected != file_len {
            return Err(GrdPacError::SizeMismatch {
                expected,
                actual: file_len,
            });
        }
        if meta.plane_len() > MAX_UNPACKED_SIZE {
            return Err(GrdPacError::InvalidData(format!(
                "{}x{} image is too large",
                meta.width, meta.height
            )));
        }
        Ok(meta)
    }

    /// Read the header from a source and validate it against its length
    pub fn read_from<R: Read + Seek>(view: &mut ArcView<R>) -> Result<Self> {
        let header = view.read_clipped(0, GRD_HEADER_SIZE as u64)?;
        Self::parse(&header, view.max_offset())
    }

    /// Header size plus all four plane sizes
    pub fn declared_len(&self) -> u64 {
        GRD_HEADER_SIZE as u64
            + self.alpha_size as u64
            + self.red_size as u64
            + self.green_size as u64
            + self.blue_size as u64
    }

    /// Compression family of the planes
    pub fn pack_type(&self) -> PackType {
        PackType::from_u8((self.format >> 8) as u8)
    }

    /// Bytes per output pixel
    pub fn pixel_size(&self) -> usize {
        self.bpp as usize / 8
    }

    /// True when an alpha plane is decoded and exported
    pub fn has_alpha(&self) -> bool {
        self.bpp == 32 && self.alpha_size > 0
    }

    /// Pixels per plane
    pub fn plane_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the packed pixel buffer
    pub fn output_len(&self) -> usize {
        self.plane_len() * self.pixel_size()
    }
}
