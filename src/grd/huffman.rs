//! Huffman stage
//!
//! A Huffman-coded plane starts with a header:
//!
//! | offset | type      | field                       |
//! |--------|-----------|-----------------------------|
//! | 0      | u32       | decoded byte count          |
//! | 4      | u32       | packed size (unused)        |
//! | 8      | u32 x 256 | frequency of each byte value|
//!
//! followed by the bit-stream, read least-significant bit first.
//!
//! The tree is rebuilt from the frequencies exactly as the encoder built it.
//! Nodes live in a 512-slot table: slots 0..=255 are leaves (the slot number
//! is the byte value), internal nodes are allocated from 256 upwards. All 256
//! leaves take part in the merge, including zero-frequency ones.
//!
//! Tie-break: nodes are merged in ascending frequency; among equal
//! frequencies the node inserted first is taken first. Leaves are inserted in
//! byte order before any internal node, and each internal node is inserted
//! when it is created. The first node taken becomes the left (0) child.

use crate::{GrdPacError, Result, MAX_UNPACKED_SIZE};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Number of leaf slots
pub const LEAF_COUNT: usize = 0x100;

/// Size of the node table
pub const NODE_COUNT: usize = 0x200;

/// Bytes preceding the bit-stream
pub const HUFFMAN_HEADER_SIZE: usize = 8 + 4 * LEAF_COUNT;

/// One slot of the node table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanNode {
    /// Leaf frequency, or sum of the children's
    pub frequency: u64,
    /// Child taken on a 0 bit
    pub left: u16,
    /// Child taken on a 1 bit
    pub right: u16,
}

/// Decoding tree rebuilt from a frequency table
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: u16,
}

impl HuffmanTree {
    /// Build the tree for a 256-entry frequency table
    ///
    /// A table with a single non-zero frequency yields a tree whose root is
    /// that leaf, so decoding it reads no bits. An all-zero table is
    /// rejected.
    pub fn from_frequencies(frequencies: &[u32; LEAF_COUNT]) -> Result<Self> {
        let mut nodes = vec![HuffmanNode::default(); NODE_COUNT];
        for (node, &freq) in nodes.iter_mut().zip(frequencies.iter()) {
            node.frequency = freq as u64;
        }

        let mut used = frequencies.iter().enumerate().filter(|(_, f)| **f != 0);
        let root = match (used.next(), used.next()) {
            (None, _) => {
                return Err(GrdPacError::InvalidData(
                    "Huffman frequency table is empty".to_string(),
                ))
            }
            (Some((symbol, _)), None) => symbol as u16,
            _ => Self::merge(&mut nodes),
        };

        Ok(Self { nodes, root })
    }

    /// Merge all leaves, returning the last node created
    fn merge(nodes: &mut [HuffmanNode]) -> u16 {
        // (frequency, insertion sequence, node index)
        let mut queue: BinaryHeap<Reverse<(u64, u32, u16)>> = (0..LEAF_COUNT)
            .map(|i| Reverse((nodes[i].frequency, i as u32, i as u16)))
            .collect();
        let mut sequence = LEAF_COUNT as u32;
        let mut next = LEAF_COUNT as u16;

        while queue.len() > 1 {
            let (Some(Reverse((lf, _, left))), Some(Reverse((rf, _, right)))) =
                (queue.pop(), queue.pop())
            else {
                break;
            };
            nodes[next as usize] = HuffmanNode {
                frequency: lf + rf,
                left,
                right,
            };
            queue.push(Reverse((lf + rf, sequence, next)));
            sequence += 1;
            next += 1;
        }

        next - 1
    }

    /// Index of the root node
    pub fn root(&self) -> u16 {
        self.root
    }

    /// Node at `index`
    pub fn node(&self, index: u16) -> &HuffmanNode {
        &self.nodes[index as usize]
    }

    /// True when the root is a leaf
    pub fn is_degenerate(&self) -> bool {
        (self.root as usize) < LEAF_COUNT
    }

    /// Walk from the root to a leaf
    pub fn decode_symbol(&self, bits: &mut LsbBitReader<'_>) -> Option<u8> {
        let mut node = self.root;
        while node as usize >= LEAF_COUNT {
            let n = &self.nodes[node as usize];
            node = if bits.next_bit()? != 0 { n.right } else { n.left };
        }
        Some(node as u8)
    }
}

/// Bit reader yielding the least significant bit of each byte first
#[derive(Debug, Clone)]
pub struct LsbBitReader<'a> {
    data: &'a [u8],
    pos: usize,
    current: u8,
    bit_position: u8,
}

impl<'a> LsbBitReader<'a> {
    /// Start reading at the first bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            current: 0,
            bit_position: 8,
        }
    }

    /// Next bit, or `None` once the input is exhausted
    pub fn next_bit(&mut self) -> Option<u8> {
        if self.bit_position == 8 {
            self.current = *self.data.get(self.pos)?;
            self.pos += 1;
            self.bit_position = 0;
        }
        let bit = self.current & 1;
        self.current >>= 1;
        self.bit_position += 1;
        Some(bit)
    }

    /// Whole bytes not yet started
    pub fn remaining_bytes(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Parsed Huffman stream header
#[derive(Debug, Clone)]
pub struct HuffmanHeader {
    /// Number of bytes to decode
    pub unpacked_size: u32,
    /// Stored packed size, not used for decoding
    pub packed_size: u32,
    /// Frequency of each byte value
    pub frequencies: [u32; LEAF_COUNT],
}

impl HuffmanHeader {
    /// Parse the header at the start of `input`
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < HUFFMAN_HEADER_SIZE {
            return Err(GrdPacError::TruncatedPayload(format!(
                "Huffman header needs {HUFFMAN_HEADER_SIZE} bytes, got {}",
                input.len()
            )));
        }
        let word =
            |i: usize| u32::from_le_bytes([input[i], input[i + 1], input[i + 2], input[i + 3]]);

        let mut frequencies = [0u32; LEAF_COUNT];
        for (i, freq) in frequencies.iter_mut().enumerate() {
            *freq = word(8 + 4 * i);
        }
        Ok(Self {
            unpacked_size: word(0),
            packed_size: word(4),
            frequencies,
        })
    }
}

/// Decode a complete Huffman-coded plane
///
/// Exactly `unpacked_size` bytes are produced; bits left over after that are
/// ignored.
pub fn unpack_huffman(input: &[u8]) -> Result<Vec<u8>> {
    let header = HuffmanHeader::parse(input)?;
    let tree = HuffmanTree::from_frequencies(&header.frequencies)?;
    let mut bits = LsbBitReader::new(&input[HUFFMAN_HEADER_SIZE..]);

    let unpacked_size = header.unpacked_size as usize;
    if unpacked_size > MAX_UNPACKED_SIZE {
        return Err(GrdPacError::InvalidData(format!(
            "Huffman stream declares {unpacked_size} bytes"
        )));
    }
    // Every symbol of a real tree costs at least one bit
    if !tree.is_degenerate() && unpacked_size > bits.remaining_bytes().saturating_mul(8) {
        return Err(GrdPacError::TruncatedPayload(format!(
            "{} bit-stream bytes cannot hold {unpacked_size} symbols",
            bits.remaining_bytes()
        )));
    }

    let mut unpacked = Vec::with_capacity(unpacked_size);
    for _ in 0..unpacked_size {
        let symbol = tree.decode_symbol(&mut bits).ok_or_else(|| {
            GrdPacError::TruncatedPayload(format!(
                "Huffman bit-stream ended after {} of {unpacked_size} bytes",
                unpacked.len()
            ))
        })?;
        unpacked.push(symbol);
    }
    Ok(unpacked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(unpacked: u32, frequencies: &[(u8, u32)], bits: &[u8]) -> Vec<u8> {
        let mut table = [0u32; LEAF_COUNT];
        for &(symbol, freq) in frequencies {
            table[symbol as usize] = freq;
        }
        let mut data = unpacked.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        for f in table {
            data.extend_from_slice(&f.to_le_bytes());
        }
        data.extend_from_slice(bits);
        data
    }

    #[test]
    fn test_bit_reader_lsb_first() {
        let mut bits = LsbBitReader::new(&[0b0000_0101, 0x80]);
        let read: Vec<u8> = std::iter::from_fn(|| bits.next_bit()).collect();
        assert_eq!(read.len(), 16);
        assert_eq!(&read[..3], &[1, 0, 1]);
        assert_eq!(read[15], 1);
    }

    #[test]
    fn test_full_table_root_is_last_node() {
        let tree = HuffmanTree::from_frequencies(&[1u32; LEAF_COUNT]).unwrap();
        assert_eq!(tree.root(), 0x1FE);
        assert_eq!(tree.node(tree.root()).frequency, 256);
        // First merge takes the two lowest-numbered leaves, left first
        assert_eq!(tree.node(0x100).left, 0);
        assert_eq!(tree.node(0x100).right, 1);
    }

    #[test]
    fn test_two_symbol_tree() {
        // Zero-frequency leaves collapse into one subtree merged with 'a'
        // (freq 1) and then with 'b' (freq 2): 'b' is one bit, '1'.
        let tree = HuffmanTree::from_frequencies(&{
            let mut t = [0u32; LEAF_COUNT];
            t[b'a' as usize] = 1;
            t[b'b' as usize] = 2;
            t
        })
        .unwrap();
        let mut bits = LsbBitReader::new(&[0b0000_0001]);
        assert_eq!(tree.decode_symbol(&mut bits), Some(b'b'));
    }

    #[test]
    fn test_degenerate_tree_reads_no_bits() {
        let data = stream(5, &[(0x7F, 42)], &[]);
        assert_eq!(unpack_huffman(&data).unwrap(), vec![0x7F; 5]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let data = stream(1, &[], &[0xFF]);
        assert!(matches!(
            unpack_huffman(&data),
            Err(GrdPacError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = stream(8, &[(1, 5), (2, 3), (3, 1)], &[0xA5, 0x3C, 0x0F]);
        let first = unpack_huffman(&data).unwrap();
        let second = unpack_huffman(&data).unwrap();
        assert_eq!(first, vec![1, 2, 3, 2, 3, 1, 1, 1]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_stream() {
        let data = stream(100, &[(1, 1), (2, 1)], &[0x00]);
        assert!(matches!(
            unpack_huffman(&data),
            Err(GrdPacError::TruncatedPayload(_))
        ));
        assert!(matches!(
            unpack_huffman(&data[..100]),
            Err(GrdPacError::TruncatedPayload(_))
        ));
    }
}
