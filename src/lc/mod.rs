//! # Link Control
//!
//! The 72-bit full link control ([`Lc`]), the privacy header ([`PrivacyLc`]),
//! the [`full_lc`] codec that rides them over RS(12,9) + BPTC(196,96), and
//! the CSBK family ([`csbk`]).

pub mod csbk;
pub mod full_lc;

pub use csbk::Csbk;

use bitflags::bitflags;

use crate::defines::Flco;

bitflags! {
    /// Service option bits carried by voice LCs and random-access requests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ServiceOptions: u8 {
        const EMERGENCY = 0x80;
        const PRIVACY   = 0x40;
        const BROADCAST = 0x10;
        const PRIORITY  = 0x03;
    }
}

impl ServiceOptions {
    pub fn priority(self) -> u8 {
        self.bits() & Self::PRIORITY.bits()
    }
}

/// Full link control: the identity of a voice or data call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lc {
    pub flco: Flco,
    pub fid: u8,
    pub options: ServiceOptions,
    pub src_id: u32,
    pub dst_id: u32,
    /// Protect flag.
    pub pf: bool,
}

impl Lc {
    pub fn new(flco: Flco, src_id: u32, dst_id: u32) -> Self {
        Lc {
            flco,
            fid: crate::defines::FID_ETSI,
            options: ServiceOptions::empty(),
            src_id: src_id & 0xFFFFFF,
            dst_id: dst_id & 0xFFFFFF,
            pf: false,
        }
    }

    /// Convenience constructor for a group voice call.
    pub fn group_voice(src_id: u32, dst_id: u32) -> Self {
        Lc::new(Flco::Group, src_id, dst_id)
    }

    /// True when the call addresses a talkgroup.
    pub fn is_group(&self) -> bool {
        self.flco == Flco::Group
    }

    /// Serializes to the 9-byte (72-bit) wire form.
    pub fn as_bytes(&self) -> [u8; 9] {
        let mut bytes = [0u8; 9];
        bytes[0] = (self.flco as u8) & 0x3F;
        if self.pf {
            bytes[0] |= 0x80;
        }
        bytes[1] = self.fid;
        bytes[2] = self.options.bits();
        bytes[3] = (self.dst_id >> 16) as u8;
        bytes[4] = (self.dst_id >> 8) as u8;
        bytes[5] = self.dst_id as u8;
        bytes[6] = (self.src_id >> 16) as u8;
        bytes[7] = (self.src_id >> 8) as u8;
        bytes[8] = self.src_id as u8;
        bytes
    }

    /// Deserializes the 9-byte wire form.
    pub fn from_bytes(bytes: &[u8; 9]) -> Self {
        Lc {
            flco: Flco::from_bits(bytes[0]),
            fid: bytes[1],
            options: ServiceOptions::from_bits_retain(bytes[2]),
            dst_id: (u32::from(bytes[3]) << 16) | (u32::from(bytes[4]) << 8) | u32::from(bytes[5]),
            src_id: (u32::from(bytes[6]) << 16) | (u32::from(bytes[7]) << 8) | u32::from(bytes[8]),
            pf: bytes[0] & 0x80 != 0,
        }
    }
}

/// Privacy (PI) header link control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivacyLc {
    pub group: bool,
    pub alg_id: u8,
    pub key_id: u8,
    pub dst_id: u32,
    pub mi: [u8; 4],
}

impl PrivacyLc {
    pub fn new(dst_id: u32) -> Self {
        PrivacyLc {
            group: true,
            alg_id: 0,
            key_id: 0,
            dst_id: dst_id & 0xFFFFFF,
            mi: [0u8; 4],
        }
    }

    /// Serializes to the 10-byte payload protected by the header CRC.
    pub fn as_bytes(&self) -> [u8; 10] {
        let mut bytes = [0u8; 10];
        bytes[0] = self.alg_id & 0x07;
        if self.group {
            bytes[0] |= 0x80;
        }
        bytes[1] = self.key_id;
        bytes[2] = (self.dst_id >> 16) as u8;
        bytes[3] = (self.dst_id >> 8) as u8;
        bytes[4] = self.dst_id as u8;
        bytes[5..9].copy_from_slice(&self.mi);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 10]) -> Self {
        PrivacyLc {
            group: bytes[0] & 0x80 != 0,
            alg_id: bytes[0] & 0x07,
            key_id: bytes[1],
            dst_id: (u32::from(bytes[2]) << 16) | (u32::from(bytes[3]) << 8) | u32::from(bytes[4]),
            mi: bytes[5..9].try_into().unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lc_byte_round_trip() {
        let mut lc = Lc::group_voice(0x2A, 0x64);
        lc.options = ServiceOptions::EMERGENCY | ServiceOptions::from_bits_retain(0x02);
        let decoded = Lc::from_bytes(&lc.as_bytes());
        assert_eq!(decoded, lc);
        assert!(decoded.options.contains(ServiceOptions::EMERGENCY));
        assert_eq!(decoded.options.priority(), 2);
    }

    #[test]
    fn test_private_lc_flco() {
        let lc = Lc::new(Flco::Private, 10, 20);
        assert!(!lc.is_group());
        assert_eq!(Lc::from_bytes(&lc.as_bytes()).flco, Flco::Private);
    }

    #[test]
    fn test_privacy_lc_round_trip() {
        let mut pi = PrivacyLc::new(0x1234);
        pi.alg_id = 0x05;
        pi.key_id = 0x21;
        pi.mi = [1, 2, 3, 4];
        assert_eq!(PrivacyLc::from_bytes(&pi.as_bytes()), pi);
    }
}
