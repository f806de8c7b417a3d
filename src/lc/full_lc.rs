//! Full LC codec: link control over RS(12,9) + BPTC(196,96).
//!
//! The 72-bit LC plus its three RS parity bytes fill the 96-bit BPTC
//! payload. The parity is XOR-masked by data type so a voice header cannot
//! be mistaken for a terminator. The privacy header travels the same BPTC
//! path but is protected by a masked CRC-CCITT instead of RS.

use crate::defines::DataType;
use crate::edac::{bptc19696, crc, rs129};
use crate::lc::{Lc, PrivacyLc};

/// RS parity mask for a voice LC header.
const MASK_VOICE_LC_HEADER: u8 = 0x96;
/// RS parity mask for a terminator with LC.
const MASK_TERMINATOR_WITH_LC: u8 = 0x99;

fn parity_mask(data_type: DataType) -> u8 {
    match data_type {
        DataType::VoiceLcHeader => MASK_VOICE_LC_HEADER,
        _ => MASK_TERMINATOR_WITH_LC,
    }
}

/// Decode a full LC from a burst of the given data type.
pub fn decode(burst: &[u8], data_type: DataType) -> Option<Lc> {
    let (payload, _) = bptc19696::decode(burst);

    let mask = parity_mask(data_type);
    let mut code = [0u8; 12];
    code.copy_from_slice(&payload);
    for b in code[9..].iter_mut() {
        *b ^= mask;
    }

    if !rs129::check(&code) {
        return None;
    }

    Some(Lc::from_bytes(code[..9].try_into().unwrap()))
}

/// Encode a full LC into a burst for the given data type.
pub fn encode(lc: &Lc, burst: &mut [u8], data_type: DataType) {
    let mask = parity_mask(data_type);
    let bytes = lc.as_bytes();
    let parity = rs129::encode(&bytes);

    let mut payload = [0u8; 12];
    payload[..9].copy_from_slice(&bytes);
    for (i, &p) in parity.iter().enumerate() {
        payload[9 + i] = p ^ mask;
    }

    bptc19696::encode(&payload, burst);
}

/// Decode a privacy (PI) header from a burst.
pub fn decode_pi(burst: &[u8]) -> Option<PrivacyLc> {
    let (payload, _) = bptc19696::decode(burst);

    if !crc::check_ccitt16(&payload, crc::CCITT_MASK_PI_HEADER) {
        return None;
    }

    Some(PrivacyLc::from_bytes(payload[..10].try_into().unwrap()))
}

/// Encode a privacy (PI) header into a burst.
pub fn encode_pi(lc: &PrivacyLc, burst: &mut [u8]) {
    let mut payload = [0u8; 12];
    payload[..10].copy_from_slice(&lc.as_bytes());
    crc::add_ccitt16(&mut payload, crc::CCITT_MASK_PI_HEADER);
    bptc19696::encode(&payload, burst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::FRAME_LENGTH_BYTES;

    #[test]
    fn test_header_round_trip() {
        let lc = Lc::group_voice(0x2A, 0x64);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&lc, &mut burst, DataType::VoiceLcHeader);
        assert_eq!(decode(&burst, DataType::VoiceLcHeader), Some(lc));
    }

    #[test]
    fn test_terminator_round_trip() {
        let lc = Lc::group_voice(0x63, 0x1388);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&lc, &mut burst, DataType::TerminatorWithLc);
        assert_eq!(decode(&burst, DataType::TerminatorWithLc), Some(lc));
    }

    #[test]
    fn test_mask_separates_data_types() {
        let lc = Lc::group_voice(0x2A, 0x64);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&lc, &mut burst, DataType::VoiceLcHeader);
        // reading the header as a terminator must fail the RS check
        assert_eq!(decode(&burst, DataType::TerminatorWithLc), None);
    }

    #[test]
    fn test_correctable_noise_tolerated() {
        let lc = Lc::group_voice(7, 9);
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode(&lc, &mut burst, DataType::VoiceLcHeader);
        burst[2] ^= 0x10;
        assert_eq!(decode(&burst, DataType::VoiceLcHeader), Some(lc));
    }

    #[test]
    fn test_pi_round_trip() {
        let mut pi = PrivacyLc::new(0x64);
        pi.alg_id = 1;
        pi.key_id = 8;
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        encode_pi(&pi, &mut burst);
        assert_eq!(decode_pi(&burst), Some(pi));
    }
}
