//! Archive index parsing
//!
//! Header layout (little-endian):
//!
//! | offset | type | field            |
//! |--------|------|------------------|
//! | 0      | i16  | entry count      |
//! | 2      | u8   | name length `L`  |
//! | 3      | u32  | data base offset |
//! | 7      |      | index records    |
//!
//! Each record is `L` bytes of name followed by either `u32 offset, u32 size`
//! (version 1) or `i64 offset, u32 size` (version 2). Offsets are relative to
//! the data base offset.

use super::{ArchiveEntry, ArchiveIndex};
use crate::view::ArcView;
use crate::{ArchiveVersion, EntryKind, GrdPacError, Result, MAX_ENTRY_COUNT, PAC_HEADER_SIZE};
use log::{debug, trace};
use std::io::{Read, Seek};

/// Infer the index layout from its geometry
///
/// The payload region must start right after the index, so exactly one of
/// the two record widths can explain `data_base_offset`.
pub fn detect_version(count: u64, name_length: u64, data_base_offset: u64) -> Option<ArchiveVersion> {
    let v1 = PAC_HEADER_SIZE + (name_length + ArchiveVersion::V1.record_tail()) * count;
    let v2 = v1 + 4 * count;
    if data_base_offset == v1 {
        Some(ArchiveVersion::V1)
    } else if data_base_offset == v2 {
        Some(ArchiveVersion::V2)
    } else {
        None
    }
}

/// Read and validate the archive index
///
/// Returns `FormatRejected` when the header does not describe a PAC index
/// and `PlacementInvalid` when any entry lies outside the file. No partial
/// index is ever returned.
pub fn read_index<R: Read + Seek>(view: &mut ArcView<R>) -> Result<ArchiveIndex> {
    let max_offset = view.max_offset();
    if max_offset < PAC_HEADER_SIZE {
        return Err(GrdPacError::FormatRejected(format!(
            "{max_offset} bytes is too short for an archive header"
        )));
    }

    let count = view.read_i16(0)? as i32;
    if !(0 < count && count < MAX_ENTRY_COUNT) {
        return Err(GrdPacError::FormatRejected(format!("bad entry count {count}")));
    }
    let count = count as u64;

    let name_length = view.read_u8(2)? as u64;
    if name_length == 0 {
        return Err(GrdPacError::FormatRejected("zero name length".into()));
    }

    let data_base_offset = view.read_u32(3)? as u64;
    if data_base_offset >= max_offset {
        return Err(GrdPacError::FormatRejected(format!(
            "data offset {data_base_offset:#x} beyond file length {max_offset:#x}"
        )));
    }

    let version = detect_version(count, name_length, data_base_offset).ok_or_else(|| {
        GrdPacError::FormatRejected(format!(
            "index geometry ({count} x {name_length}) does not match data offset {data_base_offset:#x}"
        ))
    })?;
    debug!("archive index: {count} entries, name length {name_length}, version {version:?}");

    let mut entries = Vec::with_capacity(count as usize);
    let mut index_offset = PAC_HEADER_SIZE;
    for _ in 0..count {
        let name = view.read_string(index_offset, name_length as usize)?;
        index_offset += name_length;

        let (relative, size) = match version {
            ArchiveVersion::V1 => (
                view.read_u32(index_offset)? as i64,
                view.read_u32(index_offset + 4)?,
            ),
            ArchiveVersion::V2 => (
                view.read_i64(index_offset)?,
                view.read_u32(index_offset + 8)?,
            ),
        };
        index_offset += version.record_tail();

        let offset = relative
            .checked_add(data_base_offset as i64)
            .and_then(|o| u64::try_from(o).ok());
        let entry = match offset {
            Some(offset) => ArchiveEntry {
                name,
                offset,
                size,
                kind: EntryKind::Unknown,
            },
            None => {
                return Err(GrdPacError::PlacementInvalid {
                    name,
                    offset: relative as u64,
                    size: size as u64,
                    file_len: max_offset,
                })
            }
        };

        if !entry.check_placement(max_offset) {
            return Err(GrdPacError::PlacementInvalid {
                name: entry.name,
                offset: entry.offset,
                size: entry.size as u64,
                file_len: max_offset,
            });
        }
        trace!("entry '{}' at {:#x}, {} bytes", entry.name, entry.offset, entry.size);
        entries.push(entry);
    }

    Ok(ArchiveIndex {
        entries,
        version,
        data_base_offset,
    })
}
