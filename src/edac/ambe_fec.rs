//! AMBE voice FEC regeneration.
//!
//! A voice burst carries three 72-bit AMBE frames (the middle frame split
//! around the sync/EMB field). Each frame protects its perceptually
//! significant bits with Golay codes: a (24,12) extended codeword, a (23,12)
//! standard codeword, and 25 unprotected bits. Regeneration decodes and
//! re-encodes both codewords in place and reports the number of corrected
//! bits, which feeds the BER statistics and the silence-threshold logic.
//!
//! The burst-to-frame bit placement matches the slot processor's silence
//! fill; the in-frame subfield order is fixed but implementation-defined
//! (vocoder interoperability is outside this crate's scope).

use crate::defines::AMBE_LENGTH_BYTES;
use crate::edac::golay;
use crate::util::bits;

/// Extract the 27-byte AMBE payload of a voice burst.
pub fn extract(burst: &[u8]) -> [u8; AMBE_LENGTH_BYTES] {
    let mut ambe = [0u8; AMBE_LENGTH_BYTES];
    ambe[..13].copy_from_slice(&burst[..13]);
    ambe[13] = (burst[13] & 0xF0) | (burst[19] & 0x0F);
    ambe[14..27].copy_from_slice(&burst[20..33]);
    ambe
}

/// Write a 27-byte AMBE payload back into a voice burst, leaving the
/// sync/EMB field untouched.
pub fn insert(ambe: &[u8; AMBE_LENGTH_BYTES], burst: &mut [u8]) {
    burst[..13].copy_from_slice(&ambe[..13]);
    burst[13] = (burst[13] & 0x0F) | (ambe[13] & 0xF0);
    burst[19] = (burst[19] & 0xF0) | (ambe[13] & 0x0F);
    burst[20..33].copy_from_slice(&ambe[14..27]);
}

/// Regenerate the FEC of every AMBE frame in a voice burst.
///
/// Returns the number of corrected bits across the burst.
pub fn regenerate(burst: &mut [u8]) -> u32 {
    let mut ambe = extract(burst);

    let mut errors = 0u32;
    for frame in 0..3 {
        errors += regenerate_frame(&mut ambe, frame * 72);
    }

    insert(&ambe, burst);
    errors
}

/// Regenerate one 72-bit frame starting at `base` bits into the payload.
fn regenerate_frame(ambe: &mut [u8; AMBE_LENGTH_BYTES], base: usize) -> u32 {
    let mut errors = 0u32;

    // C0: extended Golay (24,12)
    let mut c0 = 0u32;
    for i in 0..24 {
        c0 = (c0 << 1) | u32::from(bits::read_bit(ambe, base + i));
    }
    let c0_data = match golay::extended::decode(c0) {
        Some((data, errs)) => {
            errors += errs as u32;
            data
        }
        None => {
            // unrecoverable; keep the received word, charge the capacity
            errors += 4;
            (c0 >> 12) as u16
        }
    };
    let c0_fixed = golay::extended::encode(c0_data);
    for i in 0..24 {
        bits::write_bit(ambe, base + i, (c0_fixed >> (23 - i)) & 1 != 0);
    }

    // C1: standard Golay (23,12)
    let mut c1 = 0u32;
    for i in 0..23 {
        c1 = (c1 << 1) | u32::from(bits::read_bit(ambe, base + 24 + i));
    }
    let c1_data = match golay::standard::decode(c1) {
        Some((data, errs)) => {
            errors += errs as u32;
            data
        }
        None => {
            errors += 4;
            (c1 >> 11) as u16
        }
    };
    let c1_fixed = golay::standard::encode(c1_data);
    for i in 0..23 {
        bits::write_bit(ambe, base + 24 + i, (c1_fixed >> (22 - i)) & 1 != 0);
    }

    // remaining 25 bits are unprotected
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::{FRAME_LENGTH_BYTES, NULL_AMBE};

    fn silence_burst() -> [u8; FRAME_LENGTH_BYTES] {
        let mut ambe = [0u8; AMBE_LENGTH_BYTES];
        for i in 0..3 {
            ambe[i * 9..(i + 1) * 9].copy_from_slice(&NULL_AMBE);
        }
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        insert(&ambe, &mut burst);
        burst
    }

    #[test]
    fn test_extract_insert_round_trip() {
        let mut ambe = [0u8; AMBE_LENGTH_BYTES];
        for (i, b) in ambe.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(17).wrapping_add(3);
        }
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        burst[14] = 0x5A; // EMB region must survive
        insert(&ambe, &mut burst);
        assert_eq!(extract(&burst), ambe);
        assert_eq!(burst[14], 0x5A);
    }

    #[test]
    fn test_regenerate_valid_frames_is_stable() {
        // build a burst whose Golay fields are all valid codewords
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        let mut ambe = [0u8; AMBE_LENGTH_BYTES];
        for frame in 0..3 {
            let base = frame * 72;
            let c0 = golay::extended::encode(0x123);
            for i in 0..24 {
                bits::write_bit(&mut ambe, base + i, (c0 >> (23 - i)) & 1 != 0);
            }
            let c1 = golay::standard::encode(0x456);
            for i in 0..23 {
                bits::write_bit(&mut ambe, base + 24 + i, (c1 >> (22 - i)) & 1 != 0);
            }
        }
        insert(&ambe, &mut burst);

        let snapshot = burst;
        assert_eq!(regenerate(&mut burst), 0);
        assert_eq!(burst, snapshot);
    }

    #[test]
    fn test_regenerate_counts_and_fixes_errors() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        let mut ambe = [0u8; AMBE_LENGTH_BYTES];
        for frame in 0..3 {
            let base = frame * 72;
            let c0 = golay::extended::encode(0x0F0);
            for i in 0..24 {
                bits::write_bit(&mut ambe, base + i, (c0 >> (23 - i)) & 1 != 0);
            }
            let c1 = golay::standard::encode(0x2AA);
            for i in 0..23 {
                bits::write_bit(&mut ambe, base + 24 + i, (c1 >> (22 - i)) & 1 != 0);
            }
        }
        insert(&ambe, &mut burst);
        let clean = burst;

        // flip two bits inside the first frame's C0 codeword
        let mut corrupted = clean;
        let mut dirty = extract(&corrupted);
        let b0 = bits::read_bit(&dirty, 0);
        bits::write_bit(&mut dirty, 0, !b0);
        let b5 = bits::read_bit(&dirty, 5);
        bits::write_bit(&mut dirty, 5, !b5);
        insert(&dirty, &mut corrupted);

        assert_eq!(regenerate(&mut corrupted), 2);
        assert_eq!(corrupted, clean);
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        // after one pass every protected field is a valid codeword, so a
        // second pass corrects nothing
        let mut burst = silence_burst();
        let _ = regenerate(&mut burst);
        let settled = burst;
        assert_eq!(regenerate(&mut burst), 0);
        assert_eq!(burst, settled);
    }
}
