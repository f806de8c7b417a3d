//! Encoding and decoding of the 3/4-rate trellis code carried by rate-3/4
//! data bursts.
//!
//! The 18-byte payload becomes 48 tribits plus a flush tribit, each mapped
//! through an 8-state encoder to one of 16 constellation points; the 49
//! points become 98 dibits, interleaved into the burst's two data regions.
//! Decoding walks the state machine; on the first point with no consistent
//! transition a bounded search substitutes candidate points, and decode
//! fails once the search stops making forward progress.

use crate::defines::FRAME_LENGTH_BYTES;
use crate::util::bits;

/// Dibit interleave schedule over the 98 transmitted dibits.
const INTERLEAVE_TABLE: [usize; 98] = [
    0, 1, 8, 9, 16, 17, 24, 25, 32, 33, 40, 41, 48, 49, 56, 57, 64, 65, 72, 73, 80, 81, 88, 89,
    96, 97, 2, 3, 10, 11, 18, 19, 26, 27, 34, 35, 42, 43, 50, 51, 58, 59, 66, 67, 74, 75, 82, 83,
    90, 91, 4, 5, 12, 13, 20, 21, 28, 29, 36, 37, 44, 45, 52, 53, 60, 61, 68, 69, 76, 77, 84, 85,
    92, 93, 6, 7, 14, 15, 22, 23, 30, 31, 38, 39, 46, 47, 54, 55, 62, 63, 70, 71, 78, 79, 86, 87,
    94, 95,
];

/// `ENCODE_TABLE[state * 8 + tribit]` is the constellation point emitted when
/// consuming `tribit` in `state`; the tribit becomes the next state.
const ENCODE_TABLE: [u8; 64] = [
    0, 8, 4, 12, 2, 10, 6, 14, //
    4, 12, 2, 10, 6, 14, 0, 8, //
    1, 9, 5, 13, 3, 11, 7, 15, //
    5, 13, 3, 11, 7, 15, 1, 9, //
    3, 11, 7, 15, 1, 9, 5, 13, //
    7, 15, 1, 9, 5, 13, 3, 11, //
    2, 10, 6, 14, 0, 8, 4, 12, //
    6, 14, 0, 8, 4, 12, 2, 10,
];

/// Constellation point to dibit pair (4FSK symbol levels).
const CONSTELLATION: [(i8, i8); 16] = [
    (1, -1),
    (-1, -1),
    (3, -3),
    (-3, -3),
    (-3, -1),
    (3, -1),
    (-1, -3),
    (1, -3),
    (-3, 3),
    (3, 3),
    (-1, 1),
    (1, 1),
    (1, 3),
    (-1, 3),
    (3, 1),
    (-3, 1),
];

/// Decode the rate-3/4 trellis payload of a burst.
///
/// Returns the 18-byte payload, or `None` when no consistent path through the
/// trellis exists even after the fix-up search.
pub fn decode(burst: &[u8]) -> Option<[u8; 18]> {
    assert!(burst.len() >= FRAME_LENGTH_BYTES);

    let dibits = deinterleave(burst);
    let mut points = [0u8; 49];
    dibits_to_points(&dibits, &mut points);

    let mut tribits = [0u8; 49];
    match check_code(&points, &mut tribits) {
        None => Some(tribits_to_bits(&tribits)),
        Some(fail_pos) => fix_code(points, fail_pos),
    }
}

/// Encode an 18-byte payload into the trellis region of `burst`, leaving the
/// sync/slot-type field untouched.
pub fn encode(payload: &[u8; 18], burst: &mut [u8]) {
    assert!(burst.len() >= FRAME_LENGTH_BYTES);

    let tribits = bits_to_tribits(payload);

    let mut points = [0u8; 49];
    let mut state = 0u8;
    for (i, &tribit) in tribits.iter().enumerate() {
        points[i] = ENCODE_TABLE[usize::from(state) * 8 + usize::from(tribit)];
        state = tribit;
    }

    let mut dibits = [0i8; 98];
    points_to_dibits(&points, &mut dibits);
    interleave(&dibits, burst);
}

fn deinterleave(burst: &[u8]) -> [i8; 98] {
    let mut dibits = [0i8; 98];
    for i in 0..98 {
        let mut n = i * 2;
        if n >= 98 {
            n += 68;
        }
        let b1 = bits::read_bit(burst, n);

        let mut n = i * 2 + 1;
        if n >= 98 {
            n += 68;
        }
        let b2 = bits::read_bit(burst, n);

        let dibit = match (b1, b2) {
            (false, true) => 3,
            (false, false) => 1,
            (true, true) => -1,
            (true, false) => -3,
        };

        dibits[INTERLEAVE_TABLE[i]] = dibit;
    }
    dibits
}

fn interleave(dibits: &[i8; 98], burst: &mut [u8]) {
    for i in 0..98 {
        let dibit = dibits[INTERLEAVE_TABLE[i]];
        let (b1, b2) = match dibit {
            3 => (false, true),
            1 => (false, false),
            -1 => (true, true),
            _ => (true, false),
        };

        let mut n = i * 2;
        if n >= 98 {
            n += 68;
        }
        bits::write_bit(burst, n, b1);

        let mut n = i * 2 + 1;
        if n >= 98 {
            n += 68;
        }
        bits::write_bit(burst, n, b2);
    }
}

fn dibits_to_points(dibits: &[i8; 98], points: &mut [u8; 49]) {
    for (i, point) in points.iter_mut().enumerate() {
        let pair = (dibits[i * 2], dibits[i * 2 + 1]);
        *point = CONSTELLATION
            .iter()
            .position(|&p| p == pair)
            .unwrap_or(0) as u8;
    }
}

fn points_to_dibits(points: &[u8; 49], dibits: &mut [i8; 98]) {
    for (i, &point) in points.iter().enumerate() {
        let (a, b) = CONSTELLATION[usize::from(point) & 0x0F];
        dibits[i * 2] = a;
        dibits[i * 2 + 1] = b;
    }
}

fn bits_to_tribits(payload: &[u8; 18]) -> [u8; 49] {
    let mut tribits = [0u8; 49];
    for (i, tribit) in tribits.iter_mut().enumerate().take(48) {
        let mut value = 0u8;
        for j in 0..3 {
            value <<= 1;
            if bits::read_bit(payload, i * 3 + j) {
                value |= 1;
            }
        }
        *tribit = value;
    }
    // the 49th tribit flushes the encoder back to state 0
    tribits[48] = 0;
    tribits
}

fn tribits_to_bits(tribits: &[u8; 49]) -> [u8; 18] {
    let mut payload = [0u8; 18];
    for (i, &tribit) in tribits.iter().enumerate().take(48) {
        for j in 0..3 {
            bits::write_bit(&mut payload, i * 3 + j, (tribit >> (2 - j)) & 1 != 0);
        }
    }
    payload
}

/// Walks the trellis; returns the first failing point index, or `None` when
/// the whole sequence is consistent (tribits filled in).
fn check_code(points: &[u8; 49], tribits: &mut [u8; 49]) -> Option<usize> {
    let mut state = 0u8;
    for (i, &point) in points.iter().enumerate() {
        let found = (0u8..8).find(|&t| ENCODE_TABLE[usize::from(state) * 8 + usize::from(t)] == point);
        match found {
            Some(t) => {
                tribits[i] = t;
                state = t;
            }
            None => return Some(i),
        }
    }
    None
}

/// Bounded substitution search around the first failing point.
fn fix_code(mut points: [u8; 49], mut fail_pos: usize, ) -> Option<[u8; 18]> {
    for _ in 0..20 {
        let mut best_pos = 0usize;
        let mut best_val = 0u8;
        for candidate in 0..16u8 {
            points[fail_pos] = candidate;
            let mut tribits = [0u8; 49];
            match check_code(&points, &mut tribits) {
                None => return Some(tribits_to_bits(&tribits)),
                Some(pos) => {
                    if pos > best_pos {
                        best_pos = pos;
                        best_val = candidate;
                    }
                }
            }
        }
        points[fail_pos] = best_val;
        if best_pos <= fail_pos {
            return None;
        }
        fail_pos = best_pos;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload(seed: u8) -> [u8; 18] {
        let mut payload = [0u8; 18];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(29).wrapping_add(seed);
        }
        payload
    }

    #[test]
    fn test_interleave_table_is_permutation() {
        let mut seen = [false; 98];
        for &idx in INTERLEAVE_TABLE.iter() {
            assert!(!seen[idx]);
            seen[idx] = true;
        }
    }

    #[test]
    fn test_encode_table_transitions_complete() {
        // from every state, the 8 tribits reach 8 distinct points
        for state in 0..8 {
            let mut seen = [false; 16];
            for t in 0..8 {
                let p = usize::from(ENCODE_TABLE[state * 8 + t]);
                assert!(!seen[p]);
                seen[p] = true;
            }
        }
    }

    #[test]
    fn test_round_trip() {
        for seed in [0u8, 7, 100, 255] {
            let payload = sample_payload(seed);
            let mut burst = [0u8; FRAME_LENGTH_BYTES];
            encode(&payload, &mut burst);
            assert_eq!(decode(&burst), Some(payload));
        }
    }

    #[test]
    fn test_sync_region_untouched() {
        let payload = sample_payload(3);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        burst[15] = 0xC3;
        encode(&payload, &mut burst);
        assert_eq!(burst[15], 0xC3);
    }

    #[test]
    fn test_single_corrupt_point_fixed() {
        let payload = sample_payload(42);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&payload, &mut burst);

        // flip one dibit pair so a single constellation point is wrong
        burst[0] ^= 0xC0;
        assert_eq!(decode(&burst), Some(payload));
    }
}
