//! Codec-layer property tests: `decode(encode(x)) == (x, ok)` for every FEC
//! in the kit, plus correction up to each code's capacity.

use dmrtrunk_rs::defines::FRAME_LENGTH_BYTES;
use dmrtrunk_rs::edac::{bptc19696, crc, golay, qr1676, rs129, rs634717, trellis};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_bptc_round_trip(payload in prop::array::uniform12(any::<u8>())) {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        bptc19696::encode(&payload, &mut burst);
        let (decoded, ok) = bptc19696::decode(&burst);
        prop_assert!(ok);
        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn prop_bptc_corrects_scattered_errors(
        payload in prop::array::uniform12(any::<u8>()),
        bit_a in 0usize..98,
        bit_b in 166usize..264,
    ) {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        bptc19696::encode(&payload, &mut burst);
        burst[bit_a / 8] ^= 0x80 >> (bit_a % 8);
        burst[bit_b / 8] ^= 0x80 >> (bit_b % 8);
        let (decoded, ok) = bptc19696::decode(&burst);
        prop_assert!(ok);
        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn prop_golay_2087_round_trip(data in any::<u8>()) {
        let word = golay::short::encode(data);
        prop_assert_eq!(golay::short::decode(word), Some((data, 0)));
    }

    #[test]
    fn prop_golay_2087_corrects_three(
        data in any::<u8>(),
        positions in prop::collection::btree_set(0u32..20, 1..=3),
    ) {
        let mut word = golay::short::encode(data);
        for &pos in positions.iter() {
            word ^= 1 << pos;
        }
        let (decoded, errs) = golay::short::decode(word).expect("correctable");
        prop_assert_eq!(decoded, data);
        prop_assert_eq!(errs, positions.len());
    }

    #[test]
    fn prop_qr1676_round_trip(data in 0u8..128) {
        prop_assert_eq!(qr1676::decode(qr1676::encode(data)), Some((data, 0)));
    }

    #[test]
    fn prop_qr1676_corrects_two(
        data in 0u8..128,
        positions in prop::collection::btree_set(0u32..16, 1..=2),
    ) {
        let mut word = qr1676::encode(data);
        for &pos in positions.iter() {
            word ^= 1 << pos;
        }
        prop_assert_eq!(qr1676::decode(word), Some((data, positions.len())));
    }

    #[test]
    fn prop_rs129_detects_single_symbol_damage(
        msg in prop::array::uniform9(any::<u8>()),
        pos in 0usize..12,
        flip in 1u8..=255,
    ) {
        let parity = rs129::encode(&msg);
        let mut code = [0u8; 12];
        code[..9].copy_from_slice(&msg);
        code[9..].copy_from_slice(&parity);
        prop_assert!(rs129::check(&code));

        code[pos] ^= flip;
        prop_assert!(!rs129::check(&code));
    }

    #[test]
    fn prop_trellis_round_trip(payload in prop::array::uniform18(any::<u8>())) {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        trellis::encode(&payload, &mut burst);
        prop_assert_eq!(trellis::decode(&burst), Some(payload));
    }

    #[test]
    fn prop_ccitt16_round_trip(mut data in prop::collection::vec(any::<u8>(), 4..32)) {
        data.extend_from_slice(&[0, 0]);
        crc::add_ccitt16(&mut data, crc::CCITT_MASK_CSBK);
        prop_assert!(crc::check_ccitt16(&data, crc::CCITT_MASK_CSBK));
        prop_assert!(!crc::check_ccitt16(&data, crc::CCITT_MASK_DATA_HEADER));
    }
}

fn rs_word(code: &rs634717::ReedSolomon, seed: u8) -> Vec<u8> {
    let mut word = vec![0u8; code.total_symbols()];
    for (i, sym) in word.iter_mut().enumerate().take(code.data_symbols()) {
        *sym = ((i as u8) ^ seed.wrapping_mul(11)) & 0x3F;
    }
    code.encode(&mut word);
    word
}

proptest! {
    #[test]
    fn prop_rs_24_12_corrects_capacity(
        seed in any::<u8>(),
        positions in prop::collection::btree_set(0usize..24, 0..=6),
        flip in 1u8..0x40,
    ) {
        let word = rs_word(&rs634717::RS_24_12, seed);
        let mut received = word.clone();
        for &pos in positions.iter() {
            received[pos] ^= flip;
        }
        let fixed = rs634717::RS_24_12.decode(&mut received);
        prop_assert_eq!(fixed, Some(positions.len()));
        prop_assert_eq!(received, word);
    }

    #[test]
    fn prop_rs_24_16_round_trip(seed in any::<u8>()) {
        let word = rs_word(&rs634717::RS_24_16, seed);
        let mut received = word.clone();
        prop_assert_eq!(rs634717::RS_24_16.decode(&mut received), Some(0));
        prop_assert_eq!(received, word);
    }

    #[test]
    fn prop_rs_36_20_corrects_capacity(
        seed in any::<u8>(),
        positions in prop::collection::btree_set(0usize..36, 0..=8),
        flip in 1u8..0x40,
    ) {
        let word = rs_word(&rs634717::RS_36_20, seed);
        let mut received = word.clone();
        for &pos in positions.iter() {
            received[pos] ^= flip;
        }
        let fixed = rs634717::RS_36_20.decode(&mut received);
        prop_assert_eq!(fixed, Some(positions.len()));
        prop_assert_eq!(received, word);
    }
}
