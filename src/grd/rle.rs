//! Run-length expansion
//!
//! Each control byte either starts a run (high bit set, low 7 bits are the
//! repeat count of the next byte) or a literal span (high bit clear, value is
//! the number of bytes to copy). A zero control byte is skipped.

/// Expand `input` into `output`, returning the number of bytes produced
///
/// Output beyond `output.len()` is dropped. A literal span or run value cut
/// off by the end of `input` contributes what is available.
pub fn unpack_rle(input: &[u8], output: &mut [u8]) -> usize {
    let mut src = 0;
    let mut dst = 0;

    while src < input.len() {
        let control = input[src];
        src += 1;

        if control > 0x7F {
            let count = (control & 0x7F) as usize;
            let Some(&value) = input.get(src) else {
                break;
            };
            src += 1;
            fill(output, dst, count, value);
            dst += count;
        } else if control > 0 {
            let count = control as usize;
            let end = (src + count).min(input.len());
            copy(output, dst, &input[src..end]);
            src += count;
            dst += count;
        }
    }

    dst.min(output.len())
}

fn fill(output: &mut [u8], dst: usize, count: usize, value: u8) {
    if dst < output.len() {
        let end = (dst + count).min(output.len());
        output[dst..end].fill(value);
    }
}

fn copy(output: &mut [u8], dst: usize, literal: &[u8]) {
    if dst < output.len() {
        let n = literal.len().min(output.len() - dst);
        output[dst..dst + n].copy_from_slice(&literal[..n]);
    }
}
