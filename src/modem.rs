//! # Modem Port
//!
//! The physical modem is an opaque byte transport owned by the host; the
//! core only needs three control operations beyond the frame queues it
//! already drains through [`crate::control::DmrControl::get_frame`]: the
//! dedicated short-LC write, the per-slot TX abort, and the CACH AT-bit
//! ignore used by a TSCC slot.

/// Control surface of the radio modem.
pub trait ModemPort {
    /// Writes the 9-byte encoded short LC through the dedicated modem call.
    fn write_short_lc(&mut self, lc: &[u8; 9]);

    /// Aborts any in-progress transmission on a slot.
    fn abort_tx(&mut self, slot_no: u8);

    /// Tells the modem to ignore the CACH AT bit on a TSCC slot.
    fn ignore_cach_at(&mut self, slot_no: u8);
}

/// A capturing modem for tests and bring-up.
#[derive(Debug, Default)]
pub struct MockModem {
    pub short_lcs: Vec<[u8; 9]>,
    pub aborts: Vec<u8>,
    pub cach_ignores: Vec<u8>,
}

impl MockModem {
    pub fn new() -> Self {
        MockModem::default()
    }
}

impl ModemPort for MockModem {
    fn write_short_lc(&mut self, lc: &[u8; 9]) {
        self.short_lcs.push(*lc);
    }

    fn abort_tx(&mut self, slot_no: u8) {
        self.aborts.push(slot_no);
    }

    fn ignore_cach_at(&mut self, slot_no: u8) {
        self.cach_ignores.push(slot_no);
    }
}
