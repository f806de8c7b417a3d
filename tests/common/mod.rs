//! Shared scaffolding for the end-to-end slot and TSCC tests: frame
//! builders, controller setup and queue draining.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use dmrtrunk_rs::config::DmrConfig;
use dmrtrunk_rs::control::DmrControl;
use dmrtrunk_rs::defines::*;
use dmrtrunk_rs::frame::{emb::Emb, slot_type::SlotType, sync};
use dmrtrunk_rs::lc::{full_lc, Csbk, Lc};
use dmrtrunk_rs::lookups::{RadioIdLookup, TalkgroupRulesLookup};
use dmrtrunk_rs::network::NetData;
use dmrtrunk_rs::site::{SiteData, SiteModel};

/// Serializes tests that observe the global activity capture.
static ACTIVITY_LOCK: Mutex<()> = Mutex::new(());

pub fn activity_guard() -> MutexGuard<'static, ()> {
    let guard = ACTIVITY_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    dmrtrunk_rs::logging::capture_activity();
    let _ = dmrtrunk_rs::logging::take_activity();
    guard
}

/// A controller with permissive lookups on channel 1.
pub fn controller(cfg: DmrConfig) -> DmrControl {
    controller_with_lookups(cfg, RadioIdLookup::new(false), TalkgroupRulesLookup::new(false))
}

pub fn controller_with_lookups(
    cfg: DmrConfig,
    rids: RadioIdLookup,
    tgs: TalkgroupRulesLookup,
) -> DmrControl {
    let site = SiteData::new(SiteModel::Small, 1, 1, false);
    DmrControl::new(cfg, site, 1, rids, tgs)
}

/// A voice LC header burst as the modem would deliver it.
pub fn header_frame(lc: &Lc) -> [u8; FRAME_LENGTH_BYTES + 2] {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[0] = TAG_DATA;
    frame[1] = SYNC_DATA | DataType::VoiceLcHeader.as_bits();
    full_lc::encode(lc, &mut frame[2..], DataType::VoiceLcHeader);
    SlotType::new(1, DataType::VoiceLcHeader).encode(&mut frame[2..]);
    sync::add_data_sync(&mut frame[2..], false);
    frame
}

/// A voice burst carrying sync (superframe index 0).
pub fn voice_sync_frame() -> [u8; FRAME_LENGTH_BYTES + 2] {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[0] = TAG_DATA;
    frame[1] = SYNC_VOICE;
    sync::add_voice_sync(&mut frame[2..], false);
    frame
}

/// A voice burst without sync at superframe index `n`.
pub fn voice_frame(n: u8) -> [u8; FRAME_LENGTH_BYTES + 2] {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[0] = TAG_DATA;
    frame[1] = n & 0x0F;
    Emb {
        color_code: 1,
        pi: false,
        lcss: 0,
    }
    .encode(&mut frame[2..]);
    frame
}

/// A terminator-with-LC burst; the slot regenerates its fields.
pub fn terminator_frame(lc: &Lc) -> [u8; FRAME_LENGTH_BYTES + 2] {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[0] = TAG_DATA;
    frame[1] = SYNC_DATA | DataType::TerminatorWithLc.as_bits();
    full_lc::encode(lc, &mut frame[2..], DataType::TerminatorWithLc);
    SlotType::new(1, DataType::TerminatorWithLc).encode(&mut frame[2..]);
    sync::add_data_sync(&mut frame[2..], false);
    frame
}

/// A CSBK burst as the modem would deliver it.
pub fn csbk_frame(csbk: &Csbk) -> [u8; FRAME_LENGTH_BYTES + 2] {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[0] = TAG_DATA;
    frame[1] = SYNC_DATA | DataType::Csbk.as_bits();
    csbk.encode(&mut frame[2..]);
    SlotType::new(1, DataType::Csbk).encode(&mut frame[2..]);
    sync::add_data_sync(&mut frame[2..], false);
    frame
}

/// A voice LC header as delivered by the peer network.
pub fn net_header(slot_no: u8, lc: &Lc) -> NetData {
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    full_lc::encode(lc, &mut burst, DataType::VoiceLcHeader);
    SlotType::new(1, DataType::VoiceLcHeader).encode(&mut burst);
    sync::add_data_sync(&mut burst, false);

    let mut data = NetData::new(slot_no, DataType::VoiceLcHeader);
    data.src_id = lc.src_id;
    data.dst_id = lc.dst_id;
    data.flco = lc.flco;
    data.payload.copy_from_slice(&burst);
    data
}

/// A sync-carrying voice burst as delivered by the peer network.
pub fn net_voice_sync(slot_no: u8, lc: &Lc) -> NetData {
    let mut data = NetData::new(slot_no, DataType::VoiceSync);
    data.src_id = lc.src_id;
    data.dst_id = lc.dst_id;
    data.flco = lc.flco;
    data.n = 0;
    data
}

/// A plain voice burst at index `n` as delivered by the peer network.
pub fn net_voice(slot_no: u8, lc: &Lc, n: u8) -> NetData {
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    Emb {
        color_code: 1,
        pi: false,
        lcss: 0,
    }
    .encode(&mut burst);

    let mut data = NetData::new(slot_no, DataType::Voice);
    data.src_id = lc.src_id;
    data.dst_id = lc.dst_id;
    data.flco = lc.flco;
    data.n = n;
    data.payload.copy_from_slice(&burst);
    data
}

/// Drain a slot's TX queue into whole frames.
pub fn drain_queue(dmr: &mut DmrControl, slot_no: u8) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let len = dmr.get_frame(slot_no, &mut buf);
        if len == 0 {
            break;
        }
        frames.push(buf[..len].to_vec());
    }
    frames
}

/// Decode the CSBKs from a drained queue in order.
pub fn decode_csbks(frames: &[Vec<u8>]) -> Vec<Csbk> {
    frames
        .iter()
        .filter_map(|frame| Csbk::decode(&frame[2..]))
        .collect()
}
