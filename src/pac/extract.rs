//! Entry extraction
//!
//! Ordinary entries are returned verbatim. Script entries are a u32 record
//! count followed by records of `u16 length, 4 bytes, payload`, where the
//! payload is `length - 4` bytes with the two nibbles of every byte swapped.

use super::sniff::{Probe, PROBE_LEN};
use super::ArchiveEntry;
use crate::view::ArcView;
use crate::{EntryKind, Result};
use log::debug;
use std::io::{Read, Seek};

/// Swap the high and low nibble of every byte
///
/// The transform is its own inverse.
pub fn swap_nibbles(data: &mut [u8]) {
    for byte in data {
        *byte = byte.rotate_left(4);
    }
}

/// De-obfuscate script records in place
///
/// Returns `false` when a record's payload runs past the end of `data`; in
/// that case everything from that record on is left untouched.
pub fn unscramble_script(data: &mut [u8], record_count: u32) -> bool {
    let mut pos = 4usize;
    for _ in 0..record_count {
        if pos + 2 > data.len() {
            break;
        }
        let chunk = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        let payload = chunk.saturating_sub(4);
        pos += 6;
        if pos + payload > data.len() {
            return false;
        }
        swap_nibbles(&mut data[pos..pos + payload]);
        pos += payload;
    }
    true
}

/// Read an entry's bytes, de-obfuscating it when it is a script
///
/// The script marker is checked again against the source; an entry whose
/// payload no longer carries it is returned raw.
pub fn read_entry<R: Read + Seek>(view: &mut ArcView<R>, entry: &ArchiveEntry) -> Result<Vec<u8>> {
    if entry.kind != EntryKind::Script {
        return view.read_bytes(entry.offset, entry.size as u64);
    }

    let head = view.read_clipped(entry.offset, PROBE_LEN)?;
    if !Probe::new(&head, entry.size).has_script_marker() {
        return view.read_bytes(entry.offset, entry.size as u64);
    }

    let record_count = view.read_u32(entry.offset)?;
    let mut data = view.read_bytes(entry.offset, entry.size as u64)?;
    if !unscramble_script(&mut data, record_count) {
        debug!(
            "'{}': script record runs past {} bytes, returning partial decode",
            entry.name,
            data.len()
        );
    }
    Ok(data)
}
