//! # Error Detection and Correction
//!
//! The FEC codec kit for the DMR air interface: every encoded field of a
//! burst decodes and regenerates through one of these modules.
//!
//! | Code | Protects |
//! |------|----------|
//! | BPTC(196,96) | voice LC headers, terminator LC, rate-1/2 data, privacy LC |
//! | Golay(20,8,7) | slot type |
//! | QR(16,7,6) | embedded signalling (EMB) |
//! | RS(12,9) | full link control checksum |
//! | RS(63,47) family | RS(24,12,13), RS(24,16,9), RS(36,20,17) shortened codes |
//! | Trellis 3/4 | rate-3/4 data blocks |
//! | Hamming | BPTC rows/columns, embedded LC, short LC |
//! | CRC-8 / CRC-9 / CRC-CCITT / 5-bit checksum | short LC, confirmed data, CSBK, data header, embedded LC |
//!
//! Decoders report correctable and uncorrectable failures distinctly: a
//! successful decode returns the payload (with a corrected-bit count where
//! the code measures one), an uncorrectable word returns `None`/`false`.

pub mod ambe_fec;
pub mod bptc19696;
pub mod crc;
pub mod golay;
pub mod hamming;
pub mod qr1676;
pub mod rs129;
pub mod rs634717;
pub mod trellis;
