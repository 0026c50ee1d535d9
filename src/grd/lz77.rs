//! Escape-byte LZ77 expansion
//!
//! The stream starts with a 12-byte sub-header whose byte 8 is the escape
//! value. After it, every byte is a literal except the escape, which is
//! followed by either:
//!
//! - the escape again: a literal escape byte
//! - `offset, count`: copy `count` bytes from `offset` bytes back
//!
//! Offsets above the escape value are stored one higher than their meaning,
//! because the escape value itself cannot be used as an offset.

use crate::{GrdPacError, Result};

/// Position of the escape byte in the sub-header
pub const LZ77_ESCAPE_POS: usize = 8;

/// First byte of the token stream
pub const LZ77_DATA_START: usize = 12;

struct Input<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Input<'_> {
    fn next(&mut self) -> Result<u8> {
        let byte = self.data.get(self.pos).copied().ok_or_else(|| {
            GrdPacError::TruncatedPayload(format!(
                "LZ77 stream ended after {} bytes",
                self.data.len()
            ))
        })?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Expand `input` until `output` is full
///
/// Back-references are copied byte by byte, so a reference that overlaps the
/// bytes it produces repeats the pattern. A reference pointing before the
/// start of `output` is rejected.
pub fn unpack_lz77(input: &[u8], output: &mut [u8]) -> Result<()> {
    if input.len() < LZ77_DATA_START && !output.is_empty() {
        return Err(GrdPacError::TruncatedPayload(format!(
            "LZ77 header needs {LZ77_DATA_START} bytes, got {}",
            input.len()
        )));
    }
    let Some(&special) = input.get(LZ77_ESCAPE_POS) else {
        return Ok(());
    };

    let mut src = Input {
        data: input,
        pos: LZ77_DATA_START,
    };
    let mut dst = 0;

    while dst < output.len() {
        let byte = src.next()?;
        if byte != special {
            output[dst] = byte;
            dst += 1;
            continue;
        }

        let offset = src.next()?;
        if offset == special {
            output[dst] = special;
            dst += 1;
            continue;
        }

        let count = src.next()? as usize;
        let mut offset = offset as usize;
        if offset > special as usize {
            offset -= 1;
        }
        if offset > dst {
            return Err(GrdPacError::InvalidData(format!(
                "LZ77 back-reference {offset} before start of output at {dst}"
            )));
        }

        let end = (dst + count).min(output.len());
        while dst < end {
            output[dst] = output[dst - offset];
            dst += 1;
        }
    }

    Ok(())
}
