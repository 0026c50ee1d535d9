//! Fixture builders shared by the integration tests and benches
//!
//! The crate only decodes, so the encoders here are the smallest ones that
//! produce streams the decoders accept.

#![allow(dead_code)]

use grdpac::grd::huffman::{HuffmanTree, LEAF_COUNT};
use grdpac::grd::lz77::{LZ77_DATA_START, LZ77_ESCAPE_POS};

/// Plane data for one GRD image, already compressed
pub struct Planes {
    pub alpha: Vec<u8>,
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

/// Build a GRD file with bounding box (0, width, 0, height)
pub fn build_grd(pack: [u8; 2], bpp: u16, width: u16, height: u16, planes: &Planes) -> Vec<u8> {
    let mut data = pack.to_vec();
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&bpp.to_le_bytes());
    for v in [0u16, width, 0, height] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    for plane in [&planes.alpha, &planes.red, &planes.green, &planes.blue] {
        data.extend_from_slice(&(plane.len() as u32).to_le_bytes());
    }
    for plane in [&planes.alpha, &planes.red, &planes.green, &planes.blue] {
        data.extend_from_slice(plane);
    }
    data
}

/// Run-length encode: runs of two or more as `0x80 | n, value`, the rest as
/// literal spans
pub fn pack_rle(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut literal: Vec<u8> = Vec::new();
    let mut i = 0;

    let flush = |out: &mut Vec<u8>, literal: &mut Vec<u8>| {
        for chunk in literal.chunks(0x7F) {
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
        literal.clear();
    };

    while i < data.len() {
        let value = data[i];
        let run = data[i..]
            .iter()
            .take(0x7F)
            .take_while(|&&b| b == value)
            .count();
        if run >= 2 {
            flush(&mut out, &mut literal);
            out.push(0x80 | run as u8);
            out.push(value);
            i += run;
        } else {
            literal.push(value);
            i += 1;
        }
    }
    flush(&mut out, &mut literal);
    out
}

/// Huffman encode with the decoder's own tree
pub fn pack_huffman(data: &[u8]) -> Vec<u8> {
    let mut frequencies = [0u32; LEAF_COUNT];
    for &b in data {
        frequencies[b as usize] += 1;
    }
    let tree = HuffmanTree::from_frequencies(&frequencies).expect("non-empty input");

    let mut codes: Vec<Vec<u8>> = vec![Vec::new(); LEAF_COUNT];
    if !tree.is_degenerate() {
        let mut stack = vec![(tree.root(), Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if (node as usize) < LEAF_COUNT {
                codes[node as usize] = path;
                continue;
            }
            let n = *tree.node(node);
            let mut left = path.clone();
            left.push(0);
            let mut right = path;
            right.push(1);
            stack.push((n.left, left));
            stack.push((n.right, right));
        }
    }

    let mut bits = Vec::new();
    let mut current = 0u8;
    let mut used = 0;
    for &b in data {
        for &bit in &codes[b as usize] {
            current |= bit << used;
            used += 1;
            if used == 8 {
                bits.push(current);
                current = 0;
                used = 0;
            }
        }
    }
    if used > 0 {
        bits.push(current);
    }

    let mut out = (data.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&(bits.len() as u32).to_le_bytes());
    for f in frequencies {
        out.extend_from_slice(&f.to_le_bytes());
    }
    out.extend_from_slice(&bits);
    out
}

/// LZ77 encode using only single-byte repeats (offset 1) for runs
pub fn pack_lz77(data: &[u8], escape: u8) -> Vec<u8> {
    let mut out = vec![0u8; LZ77_DATA_START];
    out[LZ77_ESCAPE_POS] = escape;

    let emit_literal = |out: &mut Vec<u8>, b: u8| {
        out.push(b);
        if b == escape {
            out.push(escape);
        }
    };

    let mut i = 0;
    while i < data.len() {
        let value = data[i];
        emit_literal(&mut out, value);
        i += 1;
        let run = data[i..]
            .iter()
            .take(0xFF)
            .take_while(|&&b| b == value)
            .count();
        if run >= 4 {
            let stored = if 1 >= escape { 2 } else { 1 };
            out.extend_from_slice(&[escape, stored, run as u8]);
            i += run;
        }
    }
    out
}

/// Build a version-1 archive
pub fn build_pac_v1(name_length: u8, entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_pac(name_length, entries, false)
}

/// Build a version-2 archive
pub fn build_pac_v2(name_length: u8, entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_pac(name_length, entries, true)
}

fn build_pac(name_length: u8, entries: &[(&str, &[u8])], wide: bool) -> Vec<u8> {
    let record = name_length as usize + if wide { 12 } else { 8 };
    let base = 7 + record * entries.len();

    let mut out = (entries.len() as u16).to_le_bytes().to_vec();
    out.push(name_length);
    out.extend_from_slice(&(base as u32).to_le_bytes());

    let mut relative = 0u64;
    for (name, payload) in entries {
        let mut field = name.as_bytes().to_vec();
        field.resize(name_length as usize, 0);
        out.extend_from_slice(&field);
        if wide {
            out.extend_from_slice(&(relative as i64).to_le_bytes());
        } else {
            out.extend_from_slice(&(relative as u32).to_le_bytes());
        }
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        relative += payload.len() as u64;
    }
    for (_, payload) in entries {
        out.extend_from_slice(payload);
    }
    out
}

/// Script payload: record count, then `u16 len, 4 marker bytes, payload`
///
/// The first record's length is 6 and its marker bytes are the script
/// signature, so the whole entry is detected as a script.
pub fn build_script(records: &[&[u8]]) -> Vec<u8> {
    let mut out = (records.len() as u32 + 1).to_le_bytes().to_vec();
    out.extend_from_slice(&6u16.to_le_bytes());
    out.extend_from_slice(&grdpac::SCRIPT_MARKER_DWORD.to_le_bytes());
    out.extend_from_slice(&[0x00, 0x00]);
    for payload in records {
        let mut scrambled = payload.to_vec();
        grdpac::pac::swap_nibbles(&mut scrambled);
        out.extend_from_slice(&((payload.len() + 4) as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(&scrambled);
    }
    out
}

/// Deterministic pseudo-random plane
pub fn gradient(len: usize, seed: u32) -> Vec<u8> {
    (0..len as u32)
        .map(|i| ((i / 7).wrapping_mul(31).wrapping_add(seed) % 256) as u8)
        .collect()
}
