//! Encoding and decoding of the (20, 8, 7) Golay code protecting the DMR
//! slot type, built as a shortening of the (24, 12, 8) extended Golay code.

pub use cai_golay::{extended, standard};

/// Encoding and decoding of the (20, 8) code.
pub mod short {
    use super::*;

    /// Encode the given 8 data bits to a 20-bit codeword.
    pub fn encode(data: u8) -> u32 {
        extended::encode(u16::from(data))
    }

    /// Try to decode the given 20-bit word to the nearest codeword, correcting
    /// up to 3 errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is
    /// the 8 data bits and `err` is the number of corrected bits. Otherwise,
    /// return `None` to indicate an unrecoverable error.
    pub fn decode(word: u32) -> Option<(u8, usize)> {
        assert_eq!(word >> 20, 0);

        extended::decode(word).and_then(|(data, err)| {
            if data >> 8 == 0 {
                Some((data as u8, err))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_round_trip() {
        for data in 0u16..256 {
            let word = short::encode(data as u8);
            assert_eq!(word >> 20, 0, "codeword exceeds 20 bits");
            assert_eq!(short::decode(word), Some((data as u8, 0)));
        }
    }

    #[test]
    fn test_short_corrects_three_errors() {
        let word = short::encode(0xA7);

        for a in 0..20 {
            assert_eq!(short::decode(word ^ (1 << a)).map(|d| d.0), Some(0xA7));
            for b in (a + 1)..20 {
                assert_eq!(
                    short::decode(word ^ (1 << a) ^ (1 << b)).map(|d| d.0),
                    Some(0xA7)
                );
            }
        }

        assert_eq!(short::decode(word ^ 0b10101).map(|d| d.0), Some(0xA7));
        assert_eq!(short::decode(word ^ 0b111).map(|d| d.0), Some(0xA7));
    }
}
