//! PAC archive reader
//!
//! A PAC file is a flat container: a 7-byte header, a fixed-width index of
//! names with offsets and sizes, then the concatenated payloads. There is no
//! version field; the layout is inferred from the index geometry (see
//! [`index::detect_version`]). After parsing, every entry is classified by
//! [`sniff::Sniffer`] and may be renamed. Script entries are de-obfuscated on
//! extraction.

pub mod extract;
pub mod index;
pub mod sniff;

pub use extract::{swap_nibbles, unscramble_script};
pub use index::{detect_version, read_index};
pub use sniff::{Classifier, Confidence, Probe, SniffContext, Sniffer, Verdict};

use crate::view::ArcView;
use crate::{ArchiveVersion, EntryKind, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// One named payload inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name; the sniffer may swap its extension
    pub name: String,
    /// Absolute offset of the payload
    pub offset: u64,
    /// Payload length in bytes
    pub size: u32,
    /// Semantic type assigned by the sniffer
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// True when the payload ends at or before `max_offset`
    pub fn check_placement(&self, max_offset: u64) -> bool {
        self.offset
            .checked_add(self.size as u64)
            .is_some_and(|end| end <= max_offset)
    }
}

/// Parsed archive directory
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    /// Entries in index order
    pub entries: Vec<ArchiveEntry>,
    /// Layout inferred from the index geometry
    pub version: ArchiveVersion,
    /// Start of the payload region
    pub data_base_offset: u64,
}

impl ArchiveIndex {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for an index without entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> std::slice::Iter<'_, ArchiveEntry> {
        self.entries.iter()
    }

    /// Look up an entry by its (possibly renamed) name
    pub fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl<'a> IntoIterator for &'a ArchiveIndex {
    type Item = &'a ArchiveEntry;
    type IntoIter = std::slice::Iter<'a, ArchiveEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An opened, parsed and classified archive
///
/// The source handle lives exactly as long as this value.
#[derive(Debug)]
pub struct PacArchive<R> {
    view: ArcView<R>,
    index: ArchiveIndex,
}

impl PacArchive<BufReader<File>> {
    /// Open an archive file, using its file stem as sniffing context
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let view = ArcView::open(path)?;
        let context = SniffContext::from_path(path);
        Self::from_view(view, &context, &Sniffer::default())
    }
}

impl<R: Read + Seek> PacArchive<R> {
    /// Parse an archive from any seekable source
    ///
    /// `archive_name` plays the role of the file stem for sniffing rules.
    pub fn new(reader: R, archive_name: &str) -> Result<Self> {
        let view = ArcView::new(reader)?;
        Self::from_view(view, &SniffContext::new(archive_name), &Sniffer::default())
    }

    /// Parse and classify with a caller-supplied sniffer
    pub fn from_view(
        mut view: ArcView<R>,
        context: &SniffContext,
        sniffer: &Sniffer,
    ) -> Result<Self> {
        let mut index = read_index(&mut view)?;
        sniffer.apply(&mut view, &mut index, context)?;
        Ok(Self { view, index })
    }

    /// Parsed index
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Entries in index order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.index.entries
    }

    /// Total archive length
    pub fn len_bytes(&self) -> u64 {
        self.view.max_offset()
    }

    /// Extract the entry at `position`, de-obfuscating scripts
    pub fn read_entry(&mut self, position: usize) -> Result<Vec<u8>> {
        let entry = self.index.entries.get(position).cloned().ok_or_else(|| {
            crate::GrdPacError::InvalidData(format!("no entry at position {position}"))
        })?;
        extract::read_entry(&mut self.view, &entry)
    }

    /// Extract an entry by name
    pub fn read_named(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.index.entries.iter().position(|e| e.name == name) {
            Some(position) => self.read_entry(position).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_placement() {
        let entry = ArchiveEntry {
            name: "a".into(),
            offset: 10,
            size: 5,
            kind: EntryKind::Unknown,
        };
        assert!(entry.check_placement(15));
        assert!(!entry.check_placement(14));

        let huge = ArchiveEntry {
            offset: u64::MAX,
            ..entry
        };
        assert!(!huge.check_placement(u64::MAX));
    }
}
