//! The short LC: the 28-bit site-wide status word carried on the CACH.
//!
//! A message is four bytes: the SLCO in the low nibble of byte 0 and 24
//! payload bits. Encoding appends a CRC-8, spreads the 36 bits over three
//! Hamming(17,12,3) rows plus a column-parity row, and interleaves the 4x17
//! matrix column-by-column into 68 bits (9 bytes, last nibble unused), which
//! is the unit written to the modem's short-LC port.

use crate::edac::crc;
use crate::edac::hamming::{Correction, H17123};
use crate::util::bits;

/// Encodes a 4-byte short LC message into its 9-byte on-air form.
pub fn encode(message: &[u8; 4]) -> [u8; 9] {
    let mut with_crc = [0u8; 5];
    with_crc[..4].copy_from_slice(message);
    with_crc[4] = crc::crc8(message);

    // 28 significant message bits: low nibble of byte 0, then bytes 1..3
    let mut data = [false; 36];
    for i in 0..4 {
        data[i] = (with_crc[0] >> (3 - i)) & 1 != 0;
    }
    bits::to_bits(&with_crc[1..], 0, &mut data[4..28]);
    for i in 0..8 {
        data[28 + i] = (with_crc[4] >> (7 - i)) & 1 != 0;
    }

    let mut matrix = [[false; 17]; 4];
    for r in 0..3 {
        let mut row = [false; 17];
        row[..12].copy_from_slice(&data[r * 12..(r + 1) * 12]);
        H17123.encode(&mut row);
        matrix[r] = row;
    }
    for c in 0..17 {
        matrix[3][c] = matrix[0][c] ^ matrix[1][c] ^ matrix[2][c];
    }

    let mut out = [0u8; 9];
    let mut pos = 0;
    for c in 0..17 {
        for row in matrix.iter() {
            bits::write_bit(&mut out, pos, row[c]);
            pos += 1;
        }
    }
    out
}

/// Decodes a 9-byte on-air short LC; `None` on an uncorrectable row or
/// failed parity/CRC.
pub fn decode(encoded: &[u8; 9]) -> Option<[u8; 4]> {
    let mut matrix = [[false; 17]; 4];
    let mut pos = 0;
    for c in 0..17 {
        for row in matrix.iter_mut() {
            row[c] = bits::read_bit(encoded, pos);
            pos += 1;
        }
    }

    for row in matrix.iter_mut().take(3) {
        if H17123.correct(row) == Correction::Unfixable {
            return None;
        }
    }

    for c in 0..17 {
        if matrix[0][c] ^ matrix[1][c] ^ matrix[2][c] != matrix[3][c] {
            return None;
        }
    }

    let mut data = [false; 36];
    for r in 0..3 {
        data[r * 12..(r + 1) * 12].copy_from_slice(&matrix[r][..12]);
    }

    let mut with_crc = [0u8; 5];
    for i in 0..4 {
        if data[i] {
            with_crc[0] |= 1 << (3 - i);
        }
    }
    bits::from_bits(&mut with_crc[1..], 0, &data[4..28]);
    for i in 0..8 {
        if data[28 + i] {
            with_crc[4] |= 1 << (7 - i);
        }
    }

    if crc::crc8(&with_crc[..4]) != with_crc[4] {
        return None;
    }

    let mut message = [0u8; 4];
    message.copy_from_slice(&with_crc[..4]);
    Some(message)
}
