//! # Site Affiliation Store
//!
//! The dynamic state the TSCC administers: unit registrations, group
//! affiliations, active channel grants and the free RF channel pool. Grants
//! expire on the store's clock; expiry (or explicit release) fires the
//! release callback so the controller can clear local or remote payload
//! activations.

use std::collections::HashMap;

use log::{debug, warn};

use crate::lookups::VoiceChData;

/// One grantable (channel, slot) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSlot {
    pub ch_no: u32,
    pub slot_no: u8,
}

/// An active channel grant.
#[derive(Debug, Clone, Copy)]
pub struct Grant {
    pub ch_no: u32,
    pub slot_no: u8,
    pub src_id: u32,
    /// Remaining lifetime in milliseconds, refreshed on touch.
    pub remaining_ms: u32,
    pub is_net: bool,
}

/// Fired when a grant leaves the table: `(ch_no, dst_id, slot_no)`.
pub type ReleaseGrantCallback = Box<dyn FnMut(u32, u32, u8)>;

/// Registrations, affiliations, grants and the free channel pool.
#[derive(Default)]
pub struct AffiliationStore {
    unit_reg: Vec<u32>,
    group_aff: HashMap<u32, u32>,
    grants: HashMap<u32, Grant>,
    grant_timeout_ms: u32,
    /// Deterministic pool order: lowest channel first, slot 1 before slot 2.
    rf_ch_pool: Vec<ChannelSlot>,
    rf_ch_data: HashMap<u32, VoiceChData>,
    tscc_channel: Option<ChannelSlot>,
    release_cb: Option<ReleaseGrantCallback>,
    released: Vec<(u32, u32, u8)>,
}

impl std::fmt::Debug for AffiliationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffiliationStore")
            .field("unit_reg", &self.unit_reg)
            .field("group_aff", &self.group_aff)
            .field("grants", &self.grants)
            .field("rf_ch_pool", &self.rf_ch_pool)
            .finish()
    }
}

impl AffiliationStore {
    pub fn new() -> Self {
        AffiliationStore::default()
    }

    /// Sets the grant lifetime applied to new grants, in seconds.
    pub fn set_grant_timeout(&mut self, secs: u32) {
        self.grant_timeout_ms = secs.saturating_mul(1000);
    }

    /// Installs the release-grant callback.
    pub fn set_release_grant_callback(&mut self, cb: ReleaseGrantCallback) {
        self.release_cb = Some(cb);
    }

    /* Channel pool */

    /// Adds both slots of an RF channel to the grant pool.
    pub fn add_rf_ch(&mut self, ch_no: u32) {
        for slot_no in [1u8, 2] {
            self.add_rf_ch_slot(ch_no, slot_no);
        }
    }

    /// Adds one (channel, slot) pair to the grant pool.
    pub fn add_rf_ch_slot(&mut self, ch_no: u32, slot_no: u8) {
        let entry = ChannelSlot { ch_no, slot_no };
        if !self.rf_ch_pool.contains(&entry) {
            self.rf_ch_pool.push(entry);
            self.rf_ch_pool
                .sort_by_key(|cs| (cs.ch_no, cs.slot_no));
        }
    }

    /// Records which slot of which channel carries the TSCC; that pair is
    /// removed from the pool permanently.
    pub fn set_slot_for_channel_tscc(&mut self, ch_no: u32, slot_no: u8) {
        self.tscc_channel = Some(ChannelSlot { ch_no, slot_no });
        self.rf_ch_pool
            .retain(|cs| !(cs.ch_no == ch_no && cs.slot_no == slot_no));
    }

    /// Sets the control endpoints of remote voice channels.
    pub fn set_rf_ch_data(&mut self, data: HashMap<u32, VoiceChData>) {
        self.rf_ch_data = data;
    }

    pub fn rf_ch_data(&self, ch_no: u32) -> Option<&VoiceChData> {
        self.rf_ch_data.get(&ch_no)
    }

    /// True when the pool has at least one grantable pair.
    pub fn is_rf_ch_available(&self) -> bool {
        !self.rf_ch_pool.is_empty()
    }

    pub fn rf_ch_count(&self) -> usize {
        self.rf_ch_pool.len()
    }

    /* Unit registration */

    pub fn unit_reg(&mut self, src_id: u32) {
        if !self.unit_reg.contains(&src_id) {
            self.unit_reg.push(src_id);
        }
    }

    pub fn unit_dereg(&mut self, src_id: u32) {
        self.unit_reg.retain(|&id| id != src_id);
        self.group_aff.remove(&src_id);
    }

    pub fn is_unit_reg(&self, src_id: u32) -> bool {
        self.unit_reg.contains(&src_id)
    }

    /* Group affiliation */

    pub fn group_aff(&mut self, src_id: u32, dst_id: u32) {
        self.group_aff.insert(src_id, dst_id);
    }

    pub fn group_unaff(&mut self, src_id: u32) {
        self.group_aff.remove(&src_id);
    }

    pub fn is_group_aff(&self, src_id: u32, dst_id: u32) -> bool {
        self.group_aff.get(&src_id) == Some(&dst_id)
    }

    /* Grants */

    pub fn is_granted(&self, dst_id: u32) -> bool {
        self.grants.contains_key(&dst_id)
    }

    /// True when the grant for `dst_id` was made on behalf of network
    /// traffic.
    pub fn is_net_granted(&self, dst_id: u32) -> bool {
        self.grants.get(&dst_id).map(|g| g.is_net).unwrap_or(false)
    }

    /// Atomically allocates a (channel, slot) pair from the pool.
    pub fn grant_ch(&mut self, dst_id: u32, src_id: u32, is_net: bool) -> bool {
        if self.rf_ch_pool.is_empty() {
            return false;
        }

        let assigned = self.rf_ch_pool.remove(0);
        self.grants.insert(
            dst_id,
            Grant {
                ch_no: assigned.ch_no,
                slot_no: assigned.slot_no,
                src_id,
                remaining_ms: self.grant_timeout_ms,
                is_net,
            },
        );

        debug!(
            "granted chNo = {}, slot = {} to dstId = {}, srcId = {}",
            assigned.ch_no, assigned.slot_no, dst_id, src_id
        );
        true
    }

    pub fn granted_ch(&self, dst_id: u32) -> Option<u32> {
        self.grants.get(&dst_id).map(|g| g.ch_no)
    }

    pub fn granted_slot(&self, dst_id: u32) -> Option<u8> {
        self.grants.get(&dst_id).map(|g| g.slot_no)
    }

    pub fn granted_src_id(&self, dst_id: u32) -> Option<u32> {
        self.grants.get(&dst_id).map(|g| g.src_id)
    }

    /// Refreshes the expiry of an active grant.
    pub fn touch_grant(&mut self, dst_id: u32) {
        let timeout = self.grant_timeout_ms;
        if let Some(grant) = self.grants.get_mut(&dst_id) {
            grant.remaining_ms = timeout;
        }
    }

    /// Releases a grant, returning its channel to the pool and firing the
    /// release callback.
    pub fn release_grant(&mut self, dst_id: u32, by_timeout: bool) -> bool {
        let grant = match self.grants.remove(&dst_id) {
            Some(grant) => grant,
            None => return false,
        };

        if by_timeout {
            warn!(
                "granted channel expired, chNo = {}, slot = {}, dstId = {}",
                grant.ch_no, grant.slot_no, dst_id
            );
        }

        self.add_rf_ch_slot(grant.ch_no, grant.slot_no);
        if let Some(tscc) = self.tscc_channel {
            self.rf_ch_pool
                .retain(|cs| !(cs.ch_no == tscc.ch_no && cs.slot_no == tscc.slot_no));
        }

        self.released.push((grant.ch_no, dst_id, grant.slot_no));
        if let Some(cb) = self.release_cb.as_mut() {
            cb(grant.ch_no, dst_id, grant.slot_no);
        }
        true
    }

    /// Drains the `(ch_no, dst_id, slot_no)` release events accumulated since
    /// the last call; the controller applies their payload-clear effects.
    pub fn take_released(&mut self) -> Vec<(u32, u32, u8)> {
        std::mem::take(&mut self.released)
    }

    /// Snapshot of the grant table as `(dst_id, ch_no)` pairs in stable
    /// order, for the late-entry rotor.
    pub fn grant_table(&self) -> Vec<(u32, u32)> {
        let mut entries: Vec<(u32, u32)> =
            self.grants.iter().map(|(&dst, g)| (dst, g.ch_no)).collect();
        entries.sort_by_key(|&(dst, _)| dst);
        entries
    }

    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    /// Advances grant expiry timers; expired grants are released through the
    /// callback path.
    pub fn clock(&mut self, ms: u32) {
        let mut expired = Vec::new();
        for (&dst_id, grant) in self.grants.iter_mut() {
            grant.remaining_ms = grant.remaining_ms.saturating_sub(ms);
            if grant.remaining_ms == 0 {
                expired.push(dst_id);
            }
        }
        for dst_id in expired {
            self.release_grant(dst_id, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store_with_pool() -> AffiliationStore {
        let mut store = AffiliationStore::new();
        store.set_grant_timeout(15);
        store.add_rf_ch(3);
        store
    }

    #[test]
    fn test_deterministic_allocation_order() {
        let mut store = AffiliationStore::new();
        store.set_grant_timeout(15);
        store.add_rf_ch(4);
        store.add_rf_ch(3);

        assert!(store.grant_ch(0x64, 0x2A, false));
        assert_eq!(store.granted_ch(0x64), Some(3));
        assert_eq!(store.granted_slot(0x64), Some(1));

        assert!(store.grant_ch(0x65, 0x2B, false));
        assert_eq!(store.granted_ch(0x65), Some(3));
        assert_eq!(store.granted_slot(0x65), Some(2));

        assert!(store.grant_ch(0x66, 0x2C, false));
        assert_eq!(store.granted_ch(0x66), Some(4));
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut store = store_with_pool();
        assert!(store.grant_ch(1, 10, false));
        assert!(store.grant_ch(2, 11, false));
        assert!(!store.is_rf_ch_available());
        assert!(!store.grant_ch(3, 12, false));
    }

    #[test]
    fn test_release_returns_channel_and_fires_callback() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let sink = released.clone();

        let mut store = store_with_pool();
        store.set_release_grant_callback(Box::new(move |ch, dst, slot| {
            sink.borrow_mut().push((ch, dst, slot));
        }));

        assert!(store.grant_ch(0x64, 0x2A, false));
        assert!(store.release_grant(0x64, false));
        assert!(!store.is_granted(0x64));
        assert_eq!(released.borrow().as_slice(), &[(3, 0x64, 1)]);
        assert_eq!(store.rf_ch_count(), 2);

        assert!(!store.release_grant(0x64, false));
    }

    #[test]
    fn test_grant_expiry_via_clock() {
        let mut store = store_with_pool();
        assert!(store.grant_ch(0x64, 0x2A, false));

        store.clock(14_000);
        assert!(store.is_granted(0x64));

        store.touch_grant(0x64);
        store.clock(14_000);
        assert!(store.is_granted(0x64), "touch must refresh expiry");

        store.clock(1_000);
        assert!(!store.is_granted(0x64));
        assert_eq!(store.rf_ch_count(), 2);
    }

    #[test]
    fn test_tscc_slot_excluded_from_pool() {
        let mut store = store_with_pool();
        store.set_slot_for_channel_tscc(3, 1);
        assert_eq!(store.rf_ch_count(), 1);

        assert!(store.grant_ch(0x64, 0x2A, false));
        assert_eq!(store.granted_slot(0x64), Some(2));
        store.release_grant(0x64, false);
        assert_eq!(store.rf_ch_count(), 1);
    }

    #[test]
    fn test_unit_registration() {
        let mut store = AffiliationStore::new();
        store.unit_reg(0x2A);
        store.unit_reg(0x2A);
        assert!(store.is_unit_reg(0x2A));
        store.group_aff(0x2A, 0x64);
        assert!(store.is_group_aff(0x2A, 0x64));
        store.unit_dereg(0x2A);
        assert!(!store.is_unit_reg(0x2A));
        assert!(!store.is_group_aff(0x2A, 0x64));
    }
}
