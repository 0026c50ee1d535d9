//! Property-based tests for the archive reader and image codecs
//!
//! These tests use randomized inputs to check that malformed data is always
//! rejected gracefully and that well-formed streams decode exactly.

mod common;

use common::{build_grd, build_pac_v1, pack_huffman, pack_lz77, pack_rle, Planes};
use grdpac::grd::{unpack_huffman, unpack_lz77, unpack_rle};
use grdpac::pac::swap_nibbles;
use grdpac::{decode_grd_bytes, PacArchive};
use proptest::prelude::*;
use std::io::Cursor;

proptest! {
    #[test]
    fn test_grd_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_grd_bytes(&data);
    }
}

proptest! {
    #[test]
    fn test_grd_with_valid_header_never_panics(
        pack in prop::sample::select(vec![0x01u8, 0xA1, 0xA2]),
        bpp in prop::sample::select(vec![24u16, 32]),
        width in 0u16..8,
        height in 0u16..8,
        alpha in prop::collection::vec(any::<u8>(), 0..64),
        red in prop::collection::vec(any::<u8>(), 0..64),
        green in prop::collection::vec(any::<u8>(), 0..64),
        blue in prop::collection::vec(any::<u8>(), 0..1100),
    ) {
        // Random plane contents behind a header that passes validation
        let planes = Planes { alpha, red, green, blue };
        let _ = decode_grd_bytes(&build_grd([1, pack], bpp, width, height, &planes));
    }
}

proptest! {
    #[test]
    fn test_archive_parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        for name in ["bggrd", "srp", "data"] {
            if let Ok(mut archive) = PacArchive::new(Cursor::new(data.clone()), name) {
                for position in 0..archive.entries().len() {
                    let _ = archive.read_entry(position);
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn test_archive_entries_round_trip(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..8)
    ) {
        let names: Vec<String> = (0..payloads.len()).map(|i| format!("entry{i:02}")).collect();
        let entries: Vec<(&str, &[u8])> = names
            .iter()
            .zip(&payloads)
            .map(|(n, p)| (n.as_str(), p.as_slice()))
            .collect();

        // Archive name with no name-based rules keeps the GRD rule out
        let mut archive = PacArchive::new(Cursor::new(build_pac_v1(12, &entries)), "misc").unwrap();
        prop_assert_eq!(archive.entries().len(), payloads.len());
        for (position, payload) in payloads.iter().enumerate() {
            if archive.entries()[position].kind != grdpac::EntryKind::Script {
                prop_assert_eq!(&archive.read_entry(position).unwrap(), payload);
            }
        }
    }
}

proptest! {
    #[test]
    fn test_rle_round_trip(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let packed = pack_rle(&data);
        let mut out = vec![0u8; data.len()];
        prop_assert_eq!(unpack_rle(&packed, &mut out), data.len());
        prop_assert_eq!(out, data);
    }
}

proptest! {
    #[test]
    fn test_rle_never_writes_past_output(
        input in prop::collection::vec(any::<u8>(), 0..300),
        len in 0usize..100,
    ) {
        let mut out = vec![0u8; len];
        prop_assert!(unpack_rle(&input, &mut out) <= len);
    }
}

proptest! {
    #[test]
    fn test_lz77_round_trip(
        runs in prop::collection::vec((any::<u8>(), 1usize..20), 0..50),
        escape in any::<u8>(),
    ) {
        let data: Vec<u8> = runs
            .iter()
            .flat_map(|&(value, count)| std::iter::repeat(value).take(count))
            .collect();
        let mut out = vec![0u8; data.len()];
        unpack_lz77(&pack_lz77(&data, escape), &mut out).unwrap();
        prop_assert_eq!(out, data);
    }
}

proptest! {
    #[test]
    fn test_lz77_never_panics(
        input in prop::collection::vec(any::<u8>(), 0..200),
        len in 0usize..300,
    ) {
        let mut out = vec![0u8; len];
        let _ = unpack_lz77(&input, &mut out);
    }
}

proptest! {
    #[test]
    fn test_huffman_round_trip(data in prop::collection::vec(any::<u8>(), 1..2000)) {
        prop_assert_eq!(unpack_huffman(&pack_huffman(&data)).unwrap(), data);
    }
}

proptest! {
    #[test]
    fn test_huffman_skewed_round_trip(
        data in prop::collection::vec(prop::sample::select(vec![0u8, 0, 0, 0, 1, 1, 2, 255]), 1..500)
    ) {
        prop_assert_eq!(unpack_huffman(&pack_huffman(&data)).unwrap(), data);
    }
}

proptest! {
    #[test]
    fn test_nibble_swap_is_self_inverse(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut swapped = data.clone();
        swap_nibbles(&mut swapped);
        swap_nibbles(&mut swapped);
        prop_assert_eq!(swapped, data);
    }
}

proptest! {
    #[test]
    fn test_grd_decode_is_deterministic(
        red in prop::collection::vec(any::<u8>(), 16),
        green in prop::collection::vec(any::<u8>(), 16),
        blue in prop::collection::vec(any::<u8>(), 16),
    ) {
        let planes = Planes {
            alpha: Vec::new(),
            red: pack_huffman(&pack_rle(&red)),
            green: pack_huffman(&pack_rle(&green)),
            blue: pack_huffman(&pack_rle(&blue)),
        };
        let data = build_grd([2, 0xA1], 24, 4, 4, &planes);

        let first = decode_grd_bytes(&data).unwrap();
        let second = decode_grd_bytes(&data).unwrap();
        prop_assert_eq!(&first.pixels, &second.pixels);

        // The top output row is the last stored row
        let top: Vec<u8> = first.pixels[..12].iter().step_by(3).copied().collect();
        prop_assert_eq!(&top[..], &red[12..]);
    }
}
