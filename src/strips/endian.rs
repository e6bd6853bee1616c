//! Sample byte order transcoding
//!
//! Uncompressed pixel data with multi-byte samples is stored in the byte
//! order of the file, so moving it into a file of the other byte order
//! means reversing every sample.

use log::trace;

/// Returns a copy of `bytes` with every sample's bytes reversed
///
/// Rows are `scan_line_stride` bytes long (0 means a single row); bytes
/// left over at the end of a row after the last whole sample are kept as
/// they are. Data is returned unchanged unless samples are a whole
/// number of bytes wider than one byte.
pub fn flip_sample_endianness(
    bytes: &[u8],
    bits_per_sample: u32,
    scan_line_stride: usize,
    from_big_endian: bool,
) -> Vec<u8> {
    let mut flipped = bytes.to_vec();
    if bits_per_sample <= 8 || bits_per_sample % 8 != 0 {
        return flipped;
    }

    let sample_width = (bits_per_sample / 8) as usize;
    let stride = if scan_line_stride == 0 { bytes.len().max(1) } else { scan_line_stride };
    trace!(
        "Flipping {}-bit samples {} big endian, stride {}",
        bits_per_sample,
        if from_big_endian { "from" } else { "to" },
        stride
    );

    for row in flipped.chunks_mut(stride) {
        for sample in row.chunks_exact_mut(sample_width) {
            sample.reverse();
        }
    }

    flipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flips_16_bit_samples() {
        let data = [0x12, 0x34, 0xAB, 0xCD];
        assert_eq!(flip_sample_endianness(&data, 16, 4, true), vec![0x34, 0x12, 0xCD, 0xAB]);
    }

    #[test]
    fn test_flips_32_bit_samples() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(flip_sample_endianness(&data, 32, 0, false), vec![4, 3, 2, 1, 8, 7, 6, 5]);
    }

    #[test]
    fn test_row_padding_is_kept() {
        // Two 16-bit samples and one padding byte per row
        let data = [1, 2, 3, 4, 9, 5, 6, 7, 8, 9];
        assert_eq!(
            flip_sample_endianness(&data, 16, 5, true),
            vec![2, 1, 4, 3, 9, 6, 5, 8, 7, 9]
        );
    }

    #[test]
    fn test_non_byte_aligned_samples_are_untouched() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(flip_sample_endianness(&data, 12, 6, true), data.to_vec());
        assert_eq!(flip_sample_endianness(&data, 8, 6, true), data.to_vec());
        assert_eq!(flip_sample_endianness(&data, 1, 6, true), data.to_vec());
    }

    #[test]
    fn test_flipping_twice_restores_data() {
        let data: Vec<u8> = (0..48).collect();
        for bits in [16, 24, 32, 64] {
            let once = flip_sample_endianness(&data, bits, 12, true);
            let twice = flip_sample_endianness(&once, bits, 12, false);
            assert_eq!(twice, data);
        }
    }
}
