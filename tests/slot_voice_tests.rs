//! End-to-end slot scenarios: a full group voice call, ACL rejection,
//! traffic collision, superframe ordering and queue boundary behaviour.

mod common;

use common::*;
use dmrtrunk_rs::config::DmrConfig;
use dmrtrunk_rs::control::DmrIo;
use dmrtrunk_rs::defines::*;
use dmrtrunk_rs::lc::Lc;
use dmrtrunk_rs::logging::take_activity;
use dmrtrunk_rs::lookups::RadioIdLookup;
use dmrtrunk_rs::modem::MockModem;
use dmrtrunk_rs::network::MockPeerNetwork;
use dmrtrunk_rs::remote::NullChannelCtrl;
use dmrtrunk_rs::slot::{NetState, RfState};
use dmrtrunk_rs::lookups::TalkgroupRulesLookup;

#[test]
fn group_voice_call_single_slot_duplex() {
    let _guard = activity_guard();

    let mut cfg = DmrConfig::default();
    cfg.validate().unwrap();
    let hang_count = cfg.hang_count();
    let mut dmr = controller(cfg);

    let mut modem = MockModem::new();
    let mut network = MockPeerNetwork::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: Some(&mut network),
        chan_ctrl: &mut chan_ctrl,
    };

    let lc = Lc::group_voice(0x2A, 0x64);

    let mut frame = header_frame(&lc);
    assert!(dmr.process_frame(1, &mut frame, &mut io));
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Audio);

    let mut frame = voice_sync_frame();
    assert!(dmr.process_frame(1, &mut frame, &mut io));
    for n in 1..=5u8 {
        let mut frame = voice_frame(n);
        assert!(dmr.process_frame(1, &mut frame, &mut io), "voice N={n}");
    }

    let mut frame = terminator_frame(&lc);
    assert!(dmr.process_frame(1, &mut frame, &mut io));
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Listening);

    // header copies + six voice bursts + the terminator hang
    let frames = drain_queue(&mut dmr, 1);
    assert_eq!(
        frames.len() as u32,
        NO_HEADERS_DUPLEX + 6 + hang_count,
        "TX queue contents"
    );

    // every outgoing burst fanned out to the peer network in order
    assert_eq!(network.frames.len(), 8);
    for (i, net_frame) in network.frames.iter().enumerate() {
        assert_eq!(net_frame.seq_no, i as u8, "monotonic seqNo");
        assert_eq!(net_frame.dst_id, 0x64);
        assert_eq!(net_frame.src_id, 0x2A);
    }
    assert_eq!(network.frames[0].data_type, DataType::VoiceLcHeader);
    assert_eq!(network.frames[7].data_type, DataType::TerminatorWithLc);

    let activity = take_activity();
    assert!(
        activity
            .iter()
            .any(|line| line.contains("Slot 1 RF voice header from 42 to TG 100")),
        "activity: {activity:?}"
    );
    assert!(
        activity
            .iter()
            .any(|line| line.contains("end of voice transmission") && line.contains("BER")),
        "activity: {activity:?}"
    );
}

#[test]
fn acl_rejection_on_rid() {
    let _guard = activity_guard();

    let mut cfg = DmrConfig::default();
    cfg.validate().unwrap();

    let mut rids = RadioIdLookup::new(false);
    rids.add(0x99, false);
    let mut dmr = controller_with_lookups(cfg, rids, TalkgroupRulesLookup::new(false));

    let mut modem = MockModem::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: None,
        chan_ctrl: &mut chan_ctrl,
    };

    let lc = Lc::group_voice(0x99, 0x64);
    let mut frame = header_frame(&lc);
    assert!(!dmr.process_frame(1, &mut frame, &mut io));

    assert!(drain_queue(&mut dmr, 1).is_empty(), "no TX emission");
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Rejected);

    let activity = take_activity();
    assert!(
        activity
            .iter()
            .any(|line| line.contains("Slot 1 RF voice rejection from 153 to TG 100")),
        "activity: {activity:?}"
    );

    dmr.clock(1, &mut io);
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Listening);
}

#[test]
fn traffic_collision_rf_preempted_by_network() {
    let _guard = activity_guard();

    let mut cfg = DmrConfig::default();
    cfg.validate().unwrap();
    let mut dmr = controller(cfg);

    let mut modem = MockModem::new();
    let mut network = MockPeerNetwork::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: Some(&mut network),
        chan_ctrl: &mut chan_ctrl,
    };

    let lc = Lc::group_voice(0x30, 0x64);
    dmr.process_network(&net_header(1, &lc), &mut io);
    assert_eq!(dmr.slot(1).unwrap().state.net_state, NetState::Audio);

    // now RF traffic to the same destination arrives
    let rf_lc = Lc::group_voice(0x2A, 0x64);
    let mut frame = header_frame(&rf_lc);
    assert!(!dmr.process_frame(1, &mut frame, &mut io));
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Rejected);

    let activity = take_activity();
    assert!(
        activity.iter().any(|line| line
            .contains("Traffic collision detect, preempting new RF traffic to existing network traffic")),
        "activity: {activity:?}"
    );

    dmr.clock(1, &mut io);
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::Listening);
}

#[test]
fn superframe_ordering_drops_duplicates_and_gaps() {
    let mut cfg = DmrConfig::default();
    cfg.validate().unwrap();
    let mut dmr = controller(cfg);

    let mut modem = MockModem::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: None,
        chan_ctrl: &mut chan_ctrl,
    };

    let lc = Lc::group_voice(0x2A, 0x64);
    let mut frame = header_frame(&lc);
    assert!(dmr.process_frame(1, &mut frame, &mut io));
    let mut frame = voice_sync_frame();
    assert!(dmr.process_frame(1, &mut frame, &mut io));

    // out-of-order N is dropped
    let mut frame = voice_frame(2);
    assert!(!dmr.process_frame(1, &mut frame, &mut io));

    // in-order N is accepted
    let mut frame = voice_frame(1);
    assert!(dmr.process_frame(1, &mut frame, &mut io));

    // a duplicate of the same N is dropped
    let mut frame = voice_frame(1);
    assert!(!dmr.process_frame(1, &mut frame, &mut io));

    assert_eq!(dmr.slot(1).unwrap().state.rf_frames, 2);
}

#[test]
fn late_entry_rejects_color_code_mismatch() {
    let mut cfg = DmrConfig::default();
    cfg.color_code = 1;
    cfg.validate().unwrap();
    let mut dmr = controller(cfg);

    let mut modem = MockModem::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: None,
        chan_ctrl: &mut chan_ctrl,
    };

    // voice sync while listening moves the slot to late entry
    let mut frame = voice_sync_frame();
    assert!(!dmr.process_frame(1, &mut frame, &mut io));
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::LateEntry);

    // an EMB with the wrong color code is rejected, state unchanged
    let mut frame = voice_frame(1);
    dmrtrunk_rs::frame::emb::Emb {
        color_code: 2,
        pi: false,
        lcss: 1,
    }
    .encode(&mut frame[2..]);
    assert!(!dmr.process_frame(1, &mut frame, &mut io));
    assert_eq!(dmr.slot(1).unwrap().state.rf_state, RfState::LateEntry);
}

#[test]
fn network_gap_fills_with_silence() {
    let mut cfg = DmrConfig::default();
    cfg.validate().unwrap();
    let mut dmr = controller(cfg);

    let mut modem = MockModem::new();
    let mut chan_ctrl = NullChannelCtrl;
    let mut io = DmrIo {
        modem: &mut modem,
        network: None,
        chan_ctrl: &mut chan_ctrl,
    };

    let lc = Lc::group_voice(0x30, 0x64);
    dmr.process_network(&net_header(1, &lc), &mut io);
    dmr.process_network(&net_voice_sync(1, &lc), &mut io);

    // skip N=1 and N=2: two silence bursts are synthesized
    dmr.process_network(&net_voice(1, &lc, 3), &mut io);

    let slot = dmr.slot(1).unwrap();
    assert_eq!(slot.state.net_lost, 2);
    assert_eq!(slot.state.net_n, 3);
}

#[test]
fn tx_ring_grows_for_rf_and_drops_for_net() {
    let mut cfg = DmrConfig::default();
    cfg.queue_size = 40;
    cfg.queue_size_max = 80;
    cfg.validate().unwrap();

    let mut slot = dmrtrunk_rs::slot::Slot::new(1, &cfg);
    let frame = [0u8; FRAME_LENGTH_BYTES + 2];

    // RF-originated adds grow the ring up to the cap
    slot.state.add_frame(&frame, false);
    slot.state.add_frame(&frame, false);
    assert_eq!(slot.state.queue.len(), 2);
    assert!(slot.state.queue.capacity() > 40);

    // past the cap the add drops and counts
    slot.state.add_frame(&frame, false);
    assert_eq!(slot.state.queue.len(), 2);
    assert_eq!(slot.state.queue.dropped(), 1);

    // net-originated adds never grow
    let mut slot = dmrtrunk_rs::slot::Slot::new(1, &cfg);
    slot.state.add_frame(&frame, true);
    slot.state.add_frame(&frame, true);
    assert_eq!(slot.state.queue.capacity(), 40);
    assert_eq!(slot.state.queue.dropped(), 1);
}
