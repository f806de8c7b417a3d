//! Encoding and decoding of the BPTC(196,96) block product code.
//!
//! The 196-bit codeword rides in the two 98-bit halves of a data burst
//! (either side of the sync/slot-type field). After deinterleaving, the bits
//! form a 13x15 matrix (plus one pad bit): rows 0-8 are Hamming(15,11,3)
//! codewords whose data region carries the 96-bit payload, and every column
//! is a Hamming(13,9,3) codeword. Decoding iterates row and column
//! corrections up to five passes, then verifies every check.

use crate::edac::hamming::{Correction, H1393, H15113};
use crate::util::bits;

/// Byte offset of the second codeword half within the burst, in bits.
const SECOND_HALF_BIT: usize = 166;

/// Deinterleave sequence step: bit `i` of the matrix came from raw bit
/// `(i * 181) % 196`.
const INTERLEAVE_STEP: usize = 181;

/// Decode the BPTC(196,96) payload of a 33-byte burst.
///
/// Returns the 12-byte payload and `true` when every row and column check
/// passes after correction; `false` marks an uncorrectable codeword (the
/// payload is still the best-effort extraction).
pub fn decode(burst: &[u8]) -> ([u8; 12], bool) {
    assert!(burst.len() >= crate::defines::FRAME_LENGTH_BYTES);

    let mut raw = [false; 196];
    for (i, bit) in raw.iter_mut().enumerate().take(98) {
        *bit = bits::read_bit(burst, i);
    }
    for i in 98..196 {
        raw[i] = bits::read_bit(burst, SECOND_HALF_BIT + i - 98);
    }

    let mut matrix = [false; 196];
    for (i, slot) in matrix.iter_mut().enumerate() {
        *slot = raw[(i * INTERLEAVE_STEP) % 196];
    }

    let ok = error_check(&mut matrix);

    let mut payload = [0u8; 12];
    let mut pos = 0;
    for &idx in data_positions().iter() {
        bits::write_bit(&mut payload, pos, matrix[idx]);
        pos += 1;
    }

    (payload, ok)
}

/// Encode a 12-byte payload into the BPTC region of `burst`, leaving the
/// sync/slot-type field untouched.
pub fn encode(payload: &[u8; 12], burst: &mut [u8]) {
    assert!(burst.len() >= crate::defines::FRAME_LENGTH_BYTES);

    let mut matrix = [false; 196];
    let mut pos = 0;
    for &idx in data_positions().iter() {
        matrix[idx] = bits::read_bit(payload, pos);
        pos += 1;
    }

    // rows 0..9 carry the Hamming(15,11,3) protection
    for r in 0..9 {
        let start = r * 15 + 1;
        H15113.encode(&mut matrix[start..start + 15]);
    }

    // every column is a Hamming(13,9,3) codeword
    for c in 0..15 {
        let mut col = [false; 13];
        for (a, slot) in col.iter_mut().enumerate() {
            *slot = matrix[c + 1 + a * 15];
        }
        H1393.encode(&mut col);
        for (a, &bit) in col.iter().enumerate() {
            matrix[c + 1 + a * 15] = bit;
        }
    }

    let mut raw = [false; 196];
    for (i, &bit) in matrix.iter().enumerate() {
        raw[(i * INTERLEAVE_STEP) % 196] = bit;
    }

    for (i, &bit) in raw.iter().enumerate().take(98) {
        bits::write_bit(burst, i, bit);
    }
    for i in 98..196 {
        bits::write_bit(burst, SECOND_HALF_BIT + i - 98, raw[i]);
    }
}

/// Matrix positions of the 96 payload bits: row 0 contributes 8 bits (after
/// the pad and three reserved bits), rows 1-8 contribute 11 bits each.
fn data_positions() -> [usize; 96] {
    let mut positions = [0usize; 96];
    let mut n = 0;
    for idx in 4..=11 {
        positions[n] = idx;
        n += 1;
    }
    for r in 1..9 {
        for idx in (r * 15 + 1)..(r * 15 + 12) {
            positions[n] = idx;
            n += 1;
        }
    }
    positions
}

/// Iterated row/column correction; returns overall validity.
fn error_check(matrix: &mut [bool; 196]) -> bool {
    let mut fixing = true;
    let mut count = 0;

    while fixing && count < 5 {
        fixing = false;

        for c in 0..15 {
            let mut col = [false; 13];
            for (a, slot) in col.iter_mut().enumerate() {
                *slot = matrix[c + 1 + a * 15];
            }
            if H1393.correct(&mut col) == Correction::Fixed {
                for (a, &bit) in col.iter().enumerate() {
                    matrix[c + 1 + a * 15] = bit;
                }
                fixing = true;
            }
        }

        for r in 0..9 {
            let start = r * 15 + 1;
            if H15113.correct(&mut matrix[start..start + 15]) == Correction::Fixed {
                fixing = true;
            }
        }

        count += 1;
    }

    // valid only when every remaining check is clean
    for c in 0..15 {
        let mut col = [false; 13];
        for (a, slot) in col.iter_mut().enumerate() {
            *slot = matrix[c + 1 + a * 15];
        }
        if H1393.correct(&mut col) != Correction::Clean {
            return false;
        }
    }
    for r in 0..9 {
        let start = r * 15 + 1;
        let mut row: [bool; 15] = matrix[start..start + 15].try_into().unwrap();
        if H15113.correct(&mut row) != Correction::Clean {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::FRAME_LENGTH_BYTES;

    #[test]
    fn test_round_trip() {
        let payload: [u8; 12] = [
            0x00, 0x20, 0x10, 0x00, 0x00, 0x64, 0x00, 0x00, 0x2A, 0x91, 0x5C, 0x38,
        ];
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&payload, &mut burst);

        let (decoded, ok) = decode(&burst);
        assert!(ok);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_sync_region_untouched() {
        let payload = [0xFFu8; 12];
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        burst[14] = 0xA5;
        burst[15] = 0x5A;
        encode(&payload, &mut burst);
        assert_eq!(burst[14], 0xA5);
        assert_eq!(burst[15], 0x5A);
    }

    #[test]
    fn test_single_bit_errors_corrected() {
        let payload: [u8; 12] = [
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44,
        ];
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&payload, &mut burst);

        for pos in [0usize, 17, 55, 97] {
            let mut corrupted = burst;
            corrupted[pos / 8] ^= 0x80 >> (pos % 8);
            let (decoded, ok) = decode(&corrupted);
            assert!(ok, "bit {pos} not corrected");
            assert_eq!(decoded, payload);
        }
        for pos in [166usize, 200, 263] {
            let mut corrupted = burst;
            corrupted[pos / 8] ^= 0x80 >> (pos % 8);
            let (decoded, ok) = decode(&corrupted);
            assert!(ok, "bit {pos} not corrected");
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn test_scattered_errors_corrected() {
        let payload = [0xA5u8; 12];
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&payload, &mut burst);

        // one error per interleaved region lands in distinct rows/columns
        let mut corrupted = burst;
        for pos in [3usize, 40, 90, 170, 220] {
            corrupted[pos / 8] ^= 0x80 >> (pos % 8);
        }
        let (decoded, ok) = decode(&corrupted);
        assert!(ok);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_garbage_reports_uncorrectable() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        for (i, b) in burst.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37) ^ 0x6B;
        }
        let (_, ok) = decode(&burst);
        assert!(!ok);
    }
}
