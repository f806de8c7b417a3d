//! The embedded signalling field (EMB) carried by voice bursts.
//!
//! 16 bits under QR(16,7,6): color code (4), the privacy indicator (1) and
//! the LCSS fragment pointer (2). The field occupies the inner nibbles of
//! bytes 13/14 and 18/19, bracketing the embedded-data fragment.

use crate::edac::qr1676;

/// Decoded EMB field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Emb {
    pub color_code: u8,
    pub pi: bool,
    pub lcss: u8,
}

impl Emb {
    /// Decodes the EMB of a voice burst; `None` when uncorrectable.
    pub fn decode(burst: &[u8]) -> Option<Emb> {
        let mut field = [0u8; 2];
        field[0] = (burst[13] << 4) & 0xF0;
        field[0] |= (burst[14] >> 4) & 0x0F;
        field[1] = (burst[18] << 4) & 0xF0;
        field[1] |= (burst[19] >> 4) & 0x0F;

        let word = (u16::from(field[0]) << 8) | u16::from(field[1]);
        let (data, _) = qr1676::decode(word)?;

        Some(Emb {
            color_code: (data >> 3) & 0x0F,
            pi: (data & 0x04) == 0x04,
            lcss: data & 0x03,
        })
    }

    /// Encodes the EMB into a voice burst.
    pub fn encode(&self, burst: &mut [u8]) {
        let data = ((self.color_code & 0x0F) << 3)
            | if self.pi { 0x04 } else { 0x00 }
            | (self.lcss & 0x03);
        let word = qr1676::encode(data);

        let field = [(word >> 8) as u8, word as u8];
        burst[13] = (burst[13] & 0xF0) | ((field[0] >> 4) & 0x0F);
        burst[14] = (burst[14] & 0x0F) | ((field[0] << 4) & 0xF0);
        burst[18] = (burst[18] & 0xF0) | ((field[1] >> 4) & 0x0F);
        burst[19] = (burst[19] & 0x0F) | ((field[1] << 4) & 0xF0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::FRAME_LENGTH_BYTES;

    #[test]
    fn test_round_trip() {
        for cc in 0..16u8 {
            for lcss in 0..4u8 {
                for pi in [false, true] {
                    let emb = Emb {
                        color_code: cc,
                        pi,
                        lcss,
                    };
                    let mut burst = [0u8; FRAME_LENGTH_BYTES];
                    emb.encode(&mut burst);
                    assert_eq!(Emb::decode(&burst), Some(emb));
                }
            }
        }
    }

    #[test]
    fn test_fragment_region_preserved() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        burst[15] = 0xAB;
        burst[16] = 0xCD;
        burst[14] = 0x05;
        Emb {
            color_code: 9,
            pi: false,
            lcss: 1,
        }
        .encode(&mut burst);
        assert_eq!(burst[15], 0xAB);
        assert_eq!(burst[16], 0xCD);
        assert_eq!(burst[14] & 0x0F, 0x05);
    }

    #[test]
    fn test_two_errors_corrected() {
        let emb = Emb {
            color_code: 3,
            pi: true,
            lcss: 2,
        };
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        emb.encode(&mut burst);
        burst[13] ^= 0x01;
        burst[18] ^= 0x08;
        assert_eq!(Emb::decode(&burst), Some(emb));
    }
}
