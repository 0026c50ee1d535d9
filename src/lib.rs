//! grdpac - reader for PAC archives and GRD images
//!
//! This crate reads the two binary formats of a visual-novel engine: the flat
//! `.pac` archive container and the `.grd` raster image stored inside it.
//! Neither format carries a version field or checksum, so everything is
//! validated by self-consistency: index geometry must explain the data
//! offset, entries must lie inside the file, and GRD plane sizes must add up
//! to the file length.
//!
//! # Features
//!
//! - Archive index parsing with version inference (32- or 64-bit offsets)
//! - Payload sniffing (Ogg, GRD, audio, script) through pluggable rules
//! - Script de-obfuscation on extraction
//! - GRD decoding: Huffman, LZ77 and RLE planes interleaved to RGB/RGBA
//! - PNG export and directory batch conversion
//! - Concurrent batch conversion (`async` feature)
//!
//! # Example - Archive
//!
//! ```no_run
//! use grdpac::PacArchive;
//!
//! let mut archive = PacArchive::open("bggrd.pac")?;
//! for entry in archive.entries() {
//!     println!("{} {:?} {} bytes", entry.name, entry.kind, entry.size);
//! }
//! let first = archive.read_entry(0)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Image
//!
//! ```no_run
//! use grdpac::{decode_grd_bytes, export};
//!
//! let data = std::fs::read("ev01.grd")?;
//! let image = decode_grd_bytes(&data)?;
//! export::save_png("ev01.png", &image)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod batch;
pub mod common;
pub mod error;
pub mod export;
pub mod grd;
pub mod pac;
pub mod view;

// Async modules (only available with async feature)
#[cfg(feature = "async")]
pub mod async_batch;

// Re-export commonly used types
pub use common::{
    ArchiveVersion, DecodeStats, EntryKind, GrdPacError, PackType, Result, GRD_HEADER_SIZE,
    MAX_ENTRY_COUNT, MAX_UNPACKED_SIZE, OGG_SIGNATURE, PAC_HEADER_SIZE, PACK_TYPE_HUFFMAN_LZ77,
    PACK_TYPE_HUFFMAN_RLE, PACK_TYPE_RLE, SCRIPT_MARKER_DWORD, SCRIPT_MARKER_WORD,
};
pub use grd::{ColorLayout, DecodedImage, GrdMetadata};
pub use pac::{ArchiveEntry, ArchiveIndex, PacArchive, SniffContext, Sniffer};
pub use view::ArcView;

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
pub use async_batch::AsyncBatchProcessor;

use std::path::Path;

// Convenience functions

/// Open, parse and classify an archive file
///
/// # Arguments
/// * `path` - Archive path; its lower-cased stem drives name-based sniffing
///
/// # Returns
/// The opened archive, or `FormatRejected`/`PlacementInvalid` when the file
/// is not a valid archive
pub fn open_archive<P: AsRef<Path>>(path: P) -> Result<PacArchive<std::io::BufReader<std::fs::File>>> {
    PacArchive::open(path)
}

/// Decode a complete GRD file held in memory
///
/// # Arguments
/// * `data` - The whole file, header included
///
/// # Returns
/// The decoded image with packed pixels, top row first
pub fn decode_grd_bytes(data: &[u8]) -> Result<DecodedImage> {
    grd::decode_grd(data)
}

/// Read and decode a GRD file
pub fn decode_grd_file<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    grd::read_grd_file(path)
}
