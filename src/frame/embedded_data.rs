//! Embedded-data accumulator.
//!
//! A voice superframe smuggles a full LC through the EMB region: four
//! consecutive bursts each carry a 32-bit fragment, assembled into a 128-bit
//! matrix of seven Hamming(16,11,4) rows plus a parity row, holding the
//! 72-bit LC and its 5-bit checksum. The accumulator tracks fragment
//! sequencing by LCSS, validates on the final fragment, and can re-emit the
//! fragments for an outgoing superframe (`get_data`), substituting a known
//! LC when the received assembly never completed.

use crate::defines::Flco;
use crate::edac::crc;
use crate::edac::hamming::{Correction, H16114};
use crate::lc::Lc;
use crate::util::bits;

/// First bit of the 32-bit embedded fragment within a burst.
const FRAGMENT_BIT: usize = 116;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblyState {
    Idle,
    First,
    Second,
    Third,
}

/// Accumulates and re-emits the embedded LC of one voice superframe.
#[derive(Debug, Clone)]
pub struct EmbeddedData {
    raw: [bool; 128],
    state: AssemblyState,
    valid: bool,
    flco: Flco,
    data: [u8; 9],
}

impl Default for EmbeddedData {
    fn default() -> Self {
        EmbeddedData {
            raw: [false; 128],
            state: AssemblyState::Idle,
            valid: false,
            flco: Flco::Group,
            data: [0u8; 9],
        }
    }
}

impl EmbeddedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one burst's fragment; returns true when the fourth fragment
    /// completes a checksum-valid assembly.
    pub fn add_data(&mut self, burst: &[u8], lcss: u8) -> bool {
        let mut fragment = [false; 32];
        bits::to_bits(burst, FRAGMENT_BIT, &mut fragment);

        match lcss {
            1 => {
                self.raw[..32].copy_from_slice(&fragment);
                self.state = AssemblyState::First;
                self.valid = false;
                false
            }
            3 => match self.state {
                AssemblyState::First => {
                    self.raw[32..64].copy_from_slice(&fragment);
                    self.state = AssemblyState::Second;
                    false
                }
                AssemblyState::Second => {
                    self.raw[64..96].copy_from_slice(&fragment);
                    self.state = AssemblyState::Third;
                    false
                }
                _ => {
                    self.state = AssemblyState::Idle;
                    false
                }
            },
            2 => {
                if self.state == AssemblyState::Third {
                    self.raw[96..].copy_from_slice(&fragment);
                    self.state = AssemblyState::Idle;
                    self.decode_assembly()
                } else {
                    self.state = AssemblyState::Idle;
                    false
                }
            }
            _ => false,
        }
    }

    /// Writes fragment `n` (voice frame index 1..=4) into a burst and
    /// returns the LCSS to advertise; other indexes emit a null fragment.
    pub fn get_data(&self, burst: &mut [u8], n: u8) -> u8 {
        if (1..=4).contains(&n) && self.valid {
            let start = usize::from(n - 1) * 32;
            let fragment: [bool; 32] = self.raw[start..start + 32].try_into().unwrap();
            bits::from_bits(burst, FRAGMENT_BIT, &fragment);
            match n {
                1 => 1,
                4 => 2,
                _ => 3,
            }
        } else {
            bits::from_bits(burst, FRAGMENT_BIT, &[false; 32]);
            0
        }
    }

    /// Loads a known LC so `get_data` can emit it even when reception of the
    /// embedded fragments failed.
    pub fn set_lc(&mut self, lc: &Lc) {
        self.data = lc.as_bytes();
        self.flco = lc.flco;
        self.valid = true;
        self.encode_assembly();
    }

    /// True once a valid LC is held.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn flco(&self) -> Option<Flco> {
        if self.valid {
            Some(self.flco)
        } else {
            None
        }
    }

    /// The raw 72-bit LC payload of the last valid assembly.
    pub fn raw_data(&self) -> [u8; 9] {
        self.data
    }

    /// The assembled LC as a link-control struct, when it carries a call.
    pub fn lc(&self) -> Option<Lc> {
        if !self.valid {
            return None;
        }
        match self.flco {
            Flco::Group | Flco::Private => Some(Lc::from_bytes(&self.data)),
            _ => None,
        }
    }

    /// Drops any partial assembly and held LC.
    pub fn reset(&mut self) {
        *self = EmbeddedData::default();
    }

    fn decode_assembly(&mut self) -> bool {
        let mut matrix = [false; 128];
        let mut b = 0usize;
        for a in 0..128 {
            matrix[b] = self.raw[a];
            b += 16;
            if b > 127 {
                b -= 127;
            }
        }

        for r in 0..7 {
            let mut row: [bool; 16] = matrix[r * 16..(r + 1) * 16].try_into().unwrap();
            if H16114.correct(&mut row) == Correction::Unfixable {
                return false;
            }
            matrix[r * 16..(r + 1) * 16].copy_from_slice(&row);
        }

        for c in 0..16 {
            let mut parity = false;
            for r in 0..8 {
                parity ^= matrix[r * 16 + c];
            }
            if parity {
                return false;
            }
        }

        let mut lc_bits = [false; 72];
        let mut n = 0;
        for r in 0..7 {
            let width = if r < 2 { 11 } else { 10 };
            for c in 0..width {
                lc_bits[n] = matrix[r * 16 + c];
                n += 1;
            }
        }

        let mut checksum = 0u8;
        for (i, &pos) in [42usize, 58, 74, 90, 106].iter().enumerate() {
            if matrix[pos] {
                checksum |= 1 << (4 - i);
            }
        }

        let mut lc_bytes = [0u8; 9];
        bits::from_bits(&mut lc_bytes, 0, &lc_bits);

        if crc::five_bit(&lc_bytes) != checksum {
            return false;
        }

        self.data = lc_bytes;
        self.flco = Flco::from_bits(lc_bytes[0]);
        self.valid = true;
        true
    }

    fn encode_assembly(&mut self) {
        let mut lc_bits = [false; 72];
        bits::to_bits(&self.data, 0, &mut lc_bits);
        let checksum = crc::five_bit(&self.data);

        let mut matrix = [false; 128];
        let mut n = 0;
        for r in 0..7 {
            let width = if r < 2 { 11 } else { 10 };
            for c in 0..width {
                matrix[r * 16 + c] = lc_bits[n];
                n += 1;
            }
        }
        for (i, &pos) in [42usize, 58, 74, 90, 106].iter().enumerate() {
            matrix[pos] = (checksum >> (4 - i)) & 1 != 0;
        }

        for r in 0..7 {
            let mut row: [bool; 16] = matrix[r * 16..(r + 1) * 16].try_into().unwrap();
            H16114.encode(&mut row);
            matrix[r * 16..(r + 1) * 16].copy_from_slice(&row);
        }
        for c in 0..16 {
            let mut parity = false;
            for r in 0..7 {
                parity ^= matrix[r * 16 + c];
            }
            matrix[112 + c] = parity;
        }

        let mut b = 0usize;
        for a in 0..128 {
            self.raw[a] = matrix[b];
            b += 16;
            if b > 127 {
                b -= 127;
            }
        }
    }
}
