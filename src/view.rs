//! Random-access little-endian reader
//!
//! `ArcView` wraps any seekable source and reads fixed-width integers, names
//! and byte spans at absolute offsets. Every read seeks first. Reads that
//! would cross the end of the source fail with `UnexpectedEof` before any
//! allocation, so callers can pass sizes taken from untrusted headers.

use crate::Result;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Seek-then-read view over an archive or image source
#[derive(Debug)]
pub struct ArcView<R> {
    inner: R,
    max_offset: u64,
}

impl ArcView<BufReader<File>> {
    /// Open a file for random access
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ArcView<R> {
    /// Wrap a seekable source, measuring its length once
    pub fn new(mut inner: R) -> Result<Self> {
        let max_offset = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, max_offset })
    }

    /// Total length of the underlying source
    pub fn max_offset(&self) -> u64 {
        self.max_offset
    }

    /// True when `len` bytes starting at `offset` lie inside the source
    pub fn contains(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.max_offset)
    }

    fn seek_checked(&mut self, offset: u64, len: u64) -> Result<()> {
        if !self.contains(offset, len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {len} bytes at {offset:#x} past end of source ({:#x})",
                    self.max_offset
                ),
            )
            .into());
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self, offset: u64) -> Result<[u8; N]> {
        self.seek_checked(offset, N as u64)?;
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read an unsigned byte
    pub fn read_u8(&mut self, offset: u64) -> Result<u8> {
        Ok(self.read_array::<1>(offset)?[0])
    }

    /// Read a signed 16-bit integer
    pub fn read_i16(&mut self, offset: u64) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array(offset)?))
    }

    /// Read an unsigned 16-bit integer
    pub fn read_u16(&mut self, offset: u64) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(offset)?))
    }

    /// Read an unsigned 32-bit integer
    pub fn read_u32(&mut self, offset: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a signed 64-bit integer
    pub fn read_i64(&mut self, offset: u64) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a fixed-length name, dropping trailing NUL padding
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn read_string(&mut self, offset: u64, len: usize) -> Result<String> {
        let bytes = self.read_bytes(offset, len as u64)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        self.seek_checked(offset, len)?;
        let mut buf = vec![0u8; len as usize];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read up to `len` bytes, clipped at the end of the source
    pub fn read_clipped(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let available = self.max_offset.saturating_sub(offset).min(len);
        if available == 0 {
            return Ok(Vec::new());
        }
        self.read_bytes(offset, available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrdPacError;
    use std::io::Cursor;

    fn view(bytes: &[u8]) -> ArcView<Cursor<Vec<u8>>> {
        ArcView::new(Cursor::new(bytes.to_vec())).unwrap()
    }

    #[test]
    fn test_integer_reads() {
        let mut v = view(&[0xFE, 0xFF, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0, 0]);
        assert_eq!(v.max_offset(), 10);
        assert_eq!(v.read_i16(0).unwrap(), -2);
        assert_eq!(v.read_u16(2).unwrap(), 0x1234);
        assert_eq!(v.read_u32(4).unwrap(), 0x1234_5678);
        assert_eq!(v.read_u8(1).unwrap(), 0xFF);
        assert_eq!(v.read_i64(2).unwrap(), 0x0000_1234_5678_1234);
    }

    #[test]
    fn test_string_strips_trailing_nuls() {
        let mut v = view(b"ab\0c\0\0\0\0");
        assert_eq!(v.read_string(0, 8).unwrap(), "ab\0c");
        assert_eq!(v.read_string(4, 4).unwrap(), "");
    }

    #[test]
    fn test_read_past_end_is_io_error() {
        let mut v = view(&[1, 2, 3]);
        match v.read_u32(0) {
            Err(GrdPacError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(v.read_bytes(2, u64::MAX).is_err());
    }

    #[test]
    fn test_read_clipped() {
        let mut v = view(&[1, 2, 3, 4]);
        assert_eq!(v.read_clipped(2, 10).unwrap(), vec![3, 4]);
        assert!(v.read_clipped(9, 10).unwrap().is_empty());
    }
}
