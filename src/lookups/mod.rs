//! # Lookup Tables and Access Control
//!
//! Read-only query oracles consulted by the slot processors: radio ID and
//! talkgroup rules (with their ACL semantics), the channel identity bandplan,
//! and per-channel control endpoints for remote voice channels. The dynamic
//! affiliation store lives in [`affiliations`].

pub mod affiliations;

pub use affiliations::AffiliationStore;

use std::collections::HashMap;

/// A radio ID entry.
#[derive(Debug, Clone, Copy)]
pub struct RadioId {
    pub enabled: bool,
}

/// Radio ID lookup with an enable flag for ACL enforcement.
///
/// With the ACL disabled, unknown radios default to permitted but an
/// explicitly disabled entry still rejects.
#[derive(Debug, Default)]
pub struct RadioIdLookup {
    acl: bool,
    entries: HashMap<u32, RadioId>,
}

impl RadioIdLookup {
    pub fn new(acl: bool) -> Self {
        RadioIdLookup {
            acl,
            entries: HashMap::new(),
        }
    }

    pub fn set_acl(&mut self, acl: bool) {
        self.acl = acl;
    }

    pub fn acl(&self) -> bool {
        self.acl
    }

    pub fn add(&mut self, id: u32, enabled: bool) {
        self.entries.insert(id, RadioId { enabled });
    }

    pub fn find(&self, id: u32) -> Option<RadioId> {
        self.entries.get(&id).copied()
    }
}

/// A talkgroup rule entry.
#[derive(Debug, Clone, Copy)]
pub struct TalkgroupRule {
    pub active: bool,
    /// Slot the talkgroup is bound to; 0 permits either slot.
    pub slot: u8,
}

/// Talkgroup rules lookup with an enable flag for ACL enforcement.
#[derive(Debug, Default)]
pub struct TalkgroupRulesLookup {
    acl: bool,
    entries: HashMap<u32, TalkgroupRule>,
}

impl TalkgroupRulesLookup {
    pub fn new(acl: bool) -> Self {
        TalkgroupRulesLookup {
            acl,
            entries: HashMap::new(),
        }
    }

    pub fn set_acl(&mut self, acl: bool) {
        self.acl = acl;
    }

    pub fn acl(&self) -> bool {
        self.acl
    }

    pub fn add(&mut self, id: u32, active: bool, slot: u8) {
        self.entries.insert(id, TalkgroupRule { active, slot });
    }

    pub fn find(&self, id: u32) -> Option<TalkgroupRule> {
        self.entries.get(&id).copied()
    }
}

/// Channel identity (bandplan) entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdenTable {
    pub channel_id: u8,
    pub base_frequency: u32,
    pub channel_spacing_khz: u32,
    pub tx_offset_mhz: f32,
}

/// Control endpoint for a remote voice channel.
#[derive(Debug, Clone, Default)]
pub struct VoiceChData {
    pub ch_no: u32,
    pub address: String,
    pub port: u16,
    pub password: String,
}

impl VoiceChData {
    pub fn new(ch_no: u32, address: &str, port: u16, password: &str) -> Self {
        VoiceChData {
            ch_no,
            address: address.to_string(),
            port,
            password: password.to_string(),
        }
    }

    /// True when the entry points at a reachable control endpoint.
    pub fn is_valid(&self) -> bool {
        self.ch_no > 0 && !self.address.is_empty() && self.port > 0
    }
}

/// Access control checks over the radio ID and talkgroup oracles.
pub struct AccessControl;

impl AccessControl {
    /// Validates a source (or target) radio ID.
    pub fn validate_src_id(rid_lookup: &RadioIdLookup, id: u32) -> bool {
        match rid_lookup.find(id) {
            Some(rid) => rid.enabled,
            // unknown IDs pass only while the ACL is disabled
            None => !rid_lookup.acl(),
        }
    }

    /// Validates a talkgroup ID, optionally slot-matched (`slot_no` = 0
    /// skips the slot check).
    pub fn validate_tg_id(tid_lookup: &TalkgroupRulesLookup, slot_no: u8, id: u32) -> bool {
        // TG0 is never valid
        if id == 0 {
            return false;
        }

        if !tid_lookup.acl() {
            return true;
        }

        match tid_lookup.find(id) {
            Some(rule) => {
                if !rule.active {
                    return false;
                }
                slot_no == 0 || rule.slot == 0 || rule.slot == slot_no
            }
            None => false,
        }
    }
}
