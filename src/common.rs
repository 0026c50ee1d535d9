//! Common types and constants for the PAC archive and GRD image formats
//!
//! This module defines the shared enums, constants, and the error type used by
//! both the archive reader (`pac`) and the image decoder (`grd`).

use thiserror::Error;

/// Semantic type assigned to an archive entry by the sniffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// No signature matched; the entry is extracted verbatim
    #[default]
    Unknown,
    /// Ogg stream or length-prefixed audio blob
    Audio,
    /// GRD image
    Image,
    /// Nibble-obfuscated script
    Script,
}

impl EntryKind {
    /// Short lower-case label used in listings and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Unknown => "unknown",
            EntryKind::Audio => "audio",
            EntryKind::Image => "image",
            EntryKind::Script => "script",
        }
    }
}

/// Archive index layout, inferred from the index geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveVersion {
    /// 32-bit relative offsets, 8 bytes per record after the name
    V1 = 1,
    /// 64-bit relative offsets, 12 bytes per record after the name
    V2 = 2,
}

impl ArchiveVersion {
    /// Number of bytes following the name in each index record
    pub fn record_tail(&self) -> u64 {
        match self {
            ArchiveVersion::V1 => 8,
            ArchiveVersion::V2 => 12,
        }
    }
}

/// Compression family of a GRD image (high byte of the format code)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackType {
    /// Plain run-length planes
    Rle,
    /// Huffman-coded stream expanded with RLE
    HuffmanRle,
    /// Huffman-coded stream expanded with LZ77
    HuffmanLz77,
}

impl PackType {
    /// Create a PackType from the format code's pack-type byte
    ///
    /// Unknown values fall back to Huffman+RLE, which is what the engine does
    /// for anything that is neither 0x01 nor 0xA2.
    pub fn from_u8(value: u8) -> Self {
        match value {
            PACK_TYPE_RLE => PackType::Rle,
            PACK_TYPE_HUFFMAN_LZ77 => PackType::HuffmanLz77,
            _ => PackType::HuffmanRle,
        }
    }

    /// Short label for logs and `info` output
    pub fn as_str(&self) -> &'static str {
        match self {
            PackType::Rle => "rle",
            PackType::HuffmanRle => "huffman+rle",
            PackType::HuffmanLz77 => "huffman+lz77",
        }
    }
}

/// Error type for archive and image operations
#[derive(Debug, Error)]
pub enum GrdPacError {
    /// Signature or geometry checks failed; the input is not this format
    #[error("Unsupported format: {0}")]
    FormatRejected(String),

    /// Declared channel sizes do not add up to the file length
    #[error("Size mismatch: header declares {expected} bytes, file has {actual}")]
    SizeMismatch {
        /// Byte count implied by the header
        expected: u64,
        /// Actual file length
        actual: u64,
    },

    /// An archive entry lies outside the file
    #[error("Entry '{name}' at {offset:#x}+{size:#x} exceeds file length {file_len:#x}")]
    PlacementInvalid {
        /// Entry name as stored in the index
        name: String,
        /// Resolved absolute offset
        offset: u64,
        /// Entry size in bytes
        size: u64,
        /// Archive length
        file_len: u64,
    },

    /// A compressed stream ended before its logical end
    #[error("Truncated payload: {0}")]
    TruncatedPayload(String),

    /// Stream content that cannot be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// PNG encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrdPacError {
    /// True when the input is simply not a supported file, as opposed to a
    /// failure while reading or decoding one
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            GrdPacError::FormatRejected(_)
                | GrdPacError::SizeMismatch { .. }
                | GrdPacError::PlacementInvalid { .. }
        )
    }
}

/// Result type alias for archive and image operations
pub type Result<T> = std::result::Result<T, GrdPacError>;

// Archive constants

/// Size of the fixed archive header (count, name length, data base offset)
pub const PAC_HEADER_SIZE: u64 = 7;

/// Exclusive upper bound on the entry count
pub const MAX_ENTRY_COUNT: i32 = 0x10000;

/// `OggS` read as a little-endian u32
pub const OGG_SIGNATURE: u32 = 0x5367_674F;

/// Script marker: u16 at +4
pub const SCRIPT_MARKER_WORD: i16 = 6;

/// Script marker: u32 at +6
pub const SCRIPT_MARKER_DWORD: u32 = 0x0014_0050;

// Image constants

/// Size of the GRD header
pub const GRD_HEADER_SIZE: usize = 0x20;

/// Pack type byte selecting plain RLE planes
pub const PACK_TYPE_RLE: u8 = 0x01;

/// Pack type byte selecting Huffman followed by RLE
pub const PACK_TYPE_HUFFMAN_RLE: u8 = 0xA1;

/// Pack type byte selecting Huffman followed by LZ77
pub const PACK_TYPE_HUFFMAN_LZ77: u8 = 0xA2;

/// Upper bound on a Huffman stream's declared output size (256 MiB)
pub const MAX_UNPACKED_SIZE: usize = 0x1000_0000;

/// Statistics gathered while decoding one image
#[derive(Debug, Default, Clone)]
pub struct DecodeStats {
    /// Number of channel planes decoded
    pub channels: usize,
    /// Compressed bytes consumed across all planes
    pub input_bytes: u64,
    /// Bytes produced by the Huffman stage (zero for plain RLE)
    pub huffman_bytes: u64,
    /// Size of the packed pixel buffer
    pub output_bytes: u64,
}
