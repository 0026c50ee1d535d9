//! Channel unpacking and pixel interleaving
//!
//! Planes are stored alpha (optional), red, green, blue, each compressed on
//! its own. Every plane is decoded into a shared scratch buffer of
//! `width * height` bytes and then scattered into the packed output, flipping
//! rows because planes are stored bottom-up.

use super::header::GrdMetadata;
use super::{huffman, lz77, rle, DecodedImage};
use crate::{DecodeStats, GrdPacError, PackType, Result, GRD_HEADER_SIZE};
use log::{debug, trace};

/// Byte position of each plane inside a packed pixel
const RED: usize = 0;
const GREEN: usize = 1;
const BLUE: usize = 2;
const ALPHA: usize = 3;

/// Decoder for one GRD image held in memory
#[derive(Debug)]
pub struct GrdReader<'a> {
    input: &'a [u8],
    info: GrdMetadata,
    pack_type: PackType,
    pixel_size: usize,
    output: Vec<u8>,
    channel: Vec<u8>,
    stats: DecodeStats,
}

impl<'a> GrdReader<'a> {
    /// Prepare a decoder for `input`, the complete file
    pub fn new(input: &'a [u8], info: GrdMetadata) -> Self {
        Self {
            input,
            info,
            pack_type: info.pack_type(),
            pixel_size: info.pixel_size(),
            output: vec![0u8; info.output_len()],
            channel: vec![0u8; info.plane_len()],
            stats: DecodeStats::default(),
        }
    }

    /// Decode all planes
    ///
    /// The read position only moves past the alpha plane when that plane is
    /// decoded; a 24-bit image with a non-zero alpha size reads red from 0x20.
    /// The scratch plane is not cleared between channels, so bytes a plane
    /// does not produce keep the previous plane's values.
    pub fn unpack(mut self) -> Result<(DecodedImage, DecodeStats)> {
        debug!(
            "unpacking {}x{} {}-bit image ({})",
            self.info.width,
            self.info.height,
            self.info.bpp,
            self.pack_type.as_str()
        );

        let mut next = GRD_HEADER_SIZE;
        if self.info.has_alpha() {
            self.unpack_channel(ALPHA, next, self.info.alpha_size)?;
            next += self.info.alpha_size as usize;
        }
        self.unpack_channel(RED, next, self.info.red_size)?;
        next += self.info.red_size as usize;
        self.unpack_channel(GREEN, next, self.info.green_size)?;
        next += self.info.green_size as usize;
        self.unpack_channel(BLUE, next, self.info.blue_size)?;

        self.stats.output_bytes = self.output.len() as u64;
        Ok((
            DecodedImage {
                metadata: self.info,
                pixels: self.output,
            },
            self.stats,
        ))
    }

    fn unpack_channel(&mut self, dst: usize, src_pos: usize, src_size: u32) -> Result<()> {
        let input = src_pos
            .checked_add(src_size as usize)
            .and_then(|end| self.input.get(src_pos..end))
            .ok_or_else(|| {
                GrdPacError::TruncatedPayload(format!(
                    "plane at {src_pos:#x} of {src_size} bytes exceeds file"
                ))
            })?;
        trace!("plane {dst}: {src_size} bytes at {src_pos:#x}");

        // Each plane sees only its own bytes. A literal span that claims more
        // than the plane holds stops at the plane end instead of reading on
        // into the next plane, so malformed files decode differently from
        // tools that read the file as one stream.
        match self.pack_type {
            PackType::Rle => {
                rle::unpack_rle(input, &mut self.channel);
            }
            PackType::HuffmanLz77 => {
                let data = huffman::unpack_huffman(input)?;
                self.stats.huffman_bytes += data.len() as u64;
                lz77::unpack_lz77(&data, &mut self.channel)?;
            }
            PackType::HuffmanRle => {
                let data = huffman::unpack_huffman(input)?;
                self.stats.huffman_bytes += data.len() as u64;
                rle::unpack_rle(&data, &mut self.channel);
            }
        }
        self.stats.channels += 1;
        self.stats.input_bytes += src_size as u64;

        self.interleave(dst);
        Ok(())
    }

    /// Scatter the scratch plane into the output, bottom row first
    fn interleave(&mut self, mut dst: usize) {
        let width = self.info.width as usize;
        if width == 0 {
            return;
        }
        for row in self.channel.chunks_exact(width).rev() {
            for &value in row {
                self.output[dst] = value;
                dst += self.pixel_size;
            }
        }
    }
}
