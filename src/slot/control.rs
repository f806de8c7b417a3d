//! Control signalling for a slot: CSBK processing on the RF and network
//! paths, the TSCC beacon writers, and the grant arbitration ladder.

use log::{debug, info, warn};

use crate::defines::*;
use crate::frame::{slot_type::SlotType, sync};
use crate::lc::Csbk;
use crate::logging::activity_log;
use crate::lookups::AccessControl;
use crate::network::NetData;
use crate::remote::{PayloadActRequest, PermitTgRequest};
use crate::slot::{NetState, RfState, SlotAction, SlotIo, SlotState};

/// Software build hash advertised by the identification beacon.
const BUILD_HASH: u32 = 0x1C0DE5A1;

/// Process a CSBK burst from the RF interface.
pub fn process(state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
    let csbk = match Csbk::decode(&frame[2..]) {
        Some(csbk) => csbk,
        None => return false,
    };

    if let Csbk::BsDwnAct { .. } = csbk {
        return false;
    }

    let gi = csbk.gi();
    let src_id = csbk.src_id();
    let dst_id = csbk.dst_id();

    if src_id != 0 || dst_id != 0 {
        if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
            warn!(
                "DMR Slot {}, Traffic collision detect, preempting new RF traffic to existing network traffic!",
                state.slot_no
            );
            return false;
        }

        if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
            warn!(
                "DMR Slot {}, DT_CSBK denial, RID rejection, srcId = {src_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }

        if gi && !AccessControl::validate_tg_id(io.tg_lookup, state.slot_no, dst_id) {
            warn!(
                "DMR Slot {}, DT_CSBK denial, TGID rejection, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }
    }

    let mut handled = false;
    match csbk {
        Csbk::Rand {
            service_kind,
            service_options,
            service_extra,
            ..
        } => {
            handled = true;

            info!(
                "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), serviceKind = ${service_kind:02X}, serviceOptions = ${service_options:02X}, serviceExtra = ${service_extra:02X}, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no
            );

            match service_kind {
                SVC_KIND_IND_VOICE_CALL => {
                    if !check_control_support(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_src(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_dst(state, io, src_id, dst_id) {
                        return false;
                    }
                    if !check_reg(state, io, src_id) {
                        return false;
                    }

                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 1);

                    if state.cfg.authoritative {
                        write_grant(state, io, src_id, dst_id, service_options, false, false);
                    } else if let Some(network) = io.network.as_deref_mut() {
                        network.write_grant_req(src_id, dst_id, state.slot_no, true);
                    }
                }
                SVC_KIND_GRP_VOICE_CALL => {
                    if !check_control_support(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_src(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_tg(state, io, src_id, dst_id) {
                        return false;
                    }

                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 1);

                    if state.cfg.authoritative {
                        write_grant(state, io, src_id, dst_id, service_options, true, false);
                    } else if let Some(network) = io.network.as_deref_mut() {
                        network.write_grant_req(src_id, dst_id, state.slot_no, false);
                    }
                }
                SVC_KIND_IND_DATA_CALL | SVC_KIND_IND_UDT_DATA_CALL => {
                    if !check_control_support(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_src(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_dst(state, io, src_id, dst_id) {
                        return false;
                    }
                    if !check_reg(state, io, src_id) {
                        return false;
                    }

                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 0);
                    write_data_grant(state, io, src_id, dst_id, service_options, false, false);
                }
                SVC_KIND_GRP_DATA_CALL | SVC_KIND_GRP_UDT_DATA_CALL => {
                    if !check_control_support(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_src(state, io, src_id) {
                        return false;
                    }
                    if !check_rand_tg(state, io, src_id, dst_id) {
                        return false;
                    }

                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 0);
                    write_data_grant(state, io, src_id, dst_id, service_options, true, false);
                }
                SVC_KIND_REG_SVC => {
                    if !check_control_support(state, io, src_id) {
                        return false;
                    }
                    write_unit_reg_rsp(state, io, src_id, service_options);
                }
                _ => {
                    warn!(
                        "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), unhandled service, serviceKind = {service_kind:02X}",
                        state.slot_no
                    );
                }
            }
        }
        Csbk::CallAlert { .. } => {
            info!(
                "DMR Slot {}, DT_CSBK, {}, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no,
                csbk.name()
            );
            activity_log(
                true,
                &format!(
                    "Slot {} call alert request from {src_id} to {dst_id}",
                    state.slot_no
                ),
            );
        }
        Csbk::AckRsp { .. } => {
            info!(
                "DMR Slot {}, DT_CSBK, {}, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no,
                csbk.name()
            );
            activity_log(
                true,
                &format!(
                    "Slot {} ack response from {src_id} to {dst_id}",
                    state.slot_no
                ),
            );
        }
        Csbk::ExtFnct { function, .. } => {
            info!(
                "DMR Slot {}, DT_CSBK, {}, op = ${function:02X}, arg = {dst_id}, tgt = {src_id}",
                state.slot_no,
                csbk.name()
            );
            log_ext_function(state.slot_no, true, function, dst_id, src_id);
        }
        Csbk::NackRsp { .. } => {
            info!(
                "DMR Slot {}, DT_CSBK, {}, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no,
                csbk.name()
            );
        }
        Csbk::Preamble { blocks, .. } => {
            debug!(
                "DMR Slot {}, DT_CSBK, CSBKO_PRECCSBK ({} Preamble CSBK), toFollow = {blocks}, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no,
                if csbk.data_content() { "Data" } else { "CSBK" }
            );
        }
        _ => {
            warn!(
                "DMR Slot {}, DT_CSBK, unhandled CSBK, csbko = ${:02X}, fid = ${:02X}",
                state.slot_no,
                csbk.csbko(),
                csbk.fid()
            );
        }
    }

    if !handled {
        // regenerate and repeat the block
        csbk.encode(&mut frame[2..]);
        SlotType::new(state.cfg.color_code, DataType::Csbk).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        state.rf_seq_no = 0;

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        if state.cfg.duplex {
            state.add_frame(frame, false);
        }

        state.write_network_with(
            frame,
            DataType::Csbk,
            if gi { Flco::Group } else { Flco::Private },
            src_id,
            dst_id,
            0,
            io,
        );
    }

    true
}

/// Process a CSBK record from the network.
pub fn process_network(state: &mut SlotState, net_data: &NetData, io: &mut SlotIo) {
    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    frame[2..].copy_from_slice(&net_data.payload);

    let csbk = match Csbk::decode(&frame[2..]) {
        Some(csbk) => csbk,
        None => {
            warn!(
                "DMR Slot {}, DT_CSBK, unable to decode the network CSBK",
                state.slot_no
            );
            return;
        }
    };

    if let Csbk::BsDwnAct { .. } = csbk {
        return;
    }

    let src_id = csbk.src_id();
    let dst_id = csbk.dst_id();

    // gate mismatched destinations while the RF TG hang runs
    if state.rf_last_dst_id != 0
        && state.rf_last_dst_id != dst_id
        && state.rf_tg_hang.is_running()
        && !state.rf_tg_hang.has_expired()
    {
        return;
    }

    let mut handled = false;
    match csbk {
        Csbk::Rand {
            service_kind,
            service_options,
            ..
        } => {
            handled = true;

            match service_kind {
                SVC_KIND_IND_VOICE_CALL => {
                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 1);
                    if state.cfg.authoritative && !io.site.affiliations.is_granted(dst_id) {
                        write_grant(state, io, src_id, dst_id, service_options, false, true);
                    }
                }
                SVC_KIND_GRP_VOICE_CALL => {
                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 1);
                    if state.cfg.authoritative && !io.site.affiliations.is_granted(dst_id) {
                        write_grant(state, io, src_id, dst_id, service_options, true, true);
                    }
                }
                SVC_KIND_IND_DATA_CALL | SVC_KIND_IND_UDT_DATA_CALL => {
                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 0);
                    if !io.site.affiliations.is_granted(dst_id) {
                        write_data_grant(state, io, src_id, dst_id, service_options, false, true);
                    }
                }
                SVC_KIND_GRP_DATA_CALL | SVC_KIND_GRP_UDT_DATA_CALL => {
                    write_ack_rsp(state, io, src_id, TS_WAIT_RSN, 0);
                    if !io.site.affiliations.is_granted(dst_id) {
                        write_data_grant(state, io, src_id, dst_id, service_options, true, true);
                    }
                }
                SVC_KIND_REG_SVC => {}
                _ => {
                    warn!(
                        "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), unhandled service, serviceKind = {service_kind:02X}",
                        state.slot_no
                    );
                }
            }
        }
        Csbk::CallAlert { .. } => {
            activity_log(
                false,
                &format!(
                    "Slot {} call alert request from {src_id} to {dst_id}",
                    state.slot_no
                ),
            );
        }
        Csbk::AckRsp { .. } => {
            activity_log(
                false,
                &format!(
                    "Slot {} ack response from {src_id} to {dst_id}",
                    state.slot_no
                ),
            );
        }
        Csbk::ExtFnct { function, .. } => {
            log_ext_function(state.slot_no, false, function, dst_id, src_id);
        }
        Csbk::NackRsp { .. } | Csbk::Preamble { .. } => {}
        _ => {
            warn!(
                "DMR Slot {}, DT_CSBK, unhandled network CSBK, csbko = ${:02X}, fid = ${:02X}",
                state.slot_no,
                csbk.csbko(),
                csbk.fid()
            );
        }
    }

    if !handled {
        if let Csbk::Preamble {
            data_follows: true,
            gi,
            blocks,
            src_id,
            dst_id,
        } = csbk
        {
            // re-expand the preamble to a full run of repeats
            let mut cbf = NO_PREAMBLE_CSBK + blocks.saturating_sub(1);
            for _ in 0..NO_PREAMBLE_CSBK {
                let repeat = Csbk::Preamble {
                    data_follows: true,
                    gi,
                    blocks: cbf,
                    src_id,
                    dst_id,
                };
                repeat.encode(&mut frame[2..]);
                SlotType::new(state.cfg.color_code, DataType::Csbk).encode(&mut frame[2..]);
                sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

                frame[0] = TAG_DATA;
                frame[1] = 0x00;

                state.add_frame(&frame, true);
                cbf = cbf.saturating_sub(1);
            }
        } else {
            csbk.encode(&mut frame[2..]);
            SlotType::new(state.cfg.color_code, DataType::Csbk).encode(&mut frame[2..]);
            sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

            frame[0] = TAG_DATA;
            frame[1] = 0x00;

            state.add_frame(&frame, true);
        }
    }
}

/* Modem frame queuing */

/// Queue a CSBK for transmission.
pub fn write_csbk(state: &mut SlotState, csbk: &Csbk) {
    // don't add any frames if the queue is full
    if state.queue.free_space() < FRAME_LENGTH_BYTES + 3 {
        return;
    }

    let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
    csbk.encode(&mut frame[2..]);
    SlotType::new(state.cfg.color_code, DataType::Csbk).encode(&mut frame[2..]);
    sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

    state.rf_seq_no = 0;

    frame[0] = TAG_DATA;
    frame[1] = 0x00;

    if state.cfg.duplex {
        state.add_frame(&frame, false);
    }
}

/* Control signalling logic */

/// Random-access services require an enabled TSCC.
fn check_control_support(state: &mut SlotState, io: &mut SlotIo, src_id: u32) -> bool {
    if !state.enable_tscc {
        warn!(
            "DMR Slot {}, random access denial, unsupported service, srcId = {src_id}",
            state.slot_no
        );
        write_ack_rsp(state, io, src_id, TS_DENY_RSN_SYS_UNSUPPORTED_SVC, 0);
        return false;
    }
    true
}

fn check_rand_src(state: &mut SlotState, io: &mut SlotIo, src_id: u32) -> bool {
    if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
        warn!(
            "DMR Slot {}, random access denial, RID rejection, srcId = {src_id}",
            state.slot_no
        );
        write_ack_rsp(state, io, src_id, TS_DENY_RSN_PERM_USER_REFUSED, 0);
        return false;
    }
    true
}

fn check_rand_dst(state: &mut SlotState, io: &mut SlotIo, src_id: u32, dst_id: u32) -> bool {
    if !AccessControl::validate_src_id(io.rid_lookup, dst_id) {
        warn!(
            "DMR Slot {}, random access denial, RID rejection, dstId = {dst_id}",
            state.slot_no
        );
        write_ack_rsp(state, io, src_id, TS_DENY_RSN_TEMP_USER_REFUSED, 0);
        return false;
    }
    true
}

fn check_rand_tg(state: &mut SlotState, io: &mut SlotIo, src_id: u32, dst_id: u32) -> bool {
    if !AccessControl::validate_tg_id(io.tg_lookup, 0, dst_id) {
        warn!(
            "DMR Slot {}, random access denial, TGID rejection, dstId = {dst_id}",
            state.slot_no
        );
        write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_GROUP_NOT_VALID, 0);
        return false;
    }
    true
}

fn check_reg(state: &mut SlotState, io: &mut SlotIo, src_id: u32) -> bool {
    if state.cfg.verify_reg && !io.site.affiliations.is_unit_reg(src_id) {
        warn!(
            "DMR Slot {}, random access denial, RID not registered, srcId = {src_id}",
            state.slot_no
        );
        write_ack_rsp(state, io, src_id, TS_DENY_RSN_PERM_USER_REFUSED, 0);
        return false;
    }
    true
}

fn write_ack_rsp(state: &mut SlotState, _io: &mut SlotIo, dst_id: u32, reason: u8, response: u8) {
    let csbk = Csbk::AckRsp {
        response,
        reason,
        src_id: WUID_ALL,
        dst_id,
    };
    write_csbk(state, &csbk);
}

/// The voice grant arbitration ladder. Returns true when a grant was issued
/// (or refreshed).
pub fn write_grant(
    state: &mut SlotState,
    io: &mut SlotIo,
    src_id: u32,
    dst_id: u32,
    service_options: u8,
    grp: bool,
    net: bool,
) -> bool {
    let emergency = service_options & 0x80 == 0x80;
    let broadcast = service_options & 0x10 == 0x10;

    // do not generate grant packets for the all-call TGID
    if dst_id == WUID_ALL {
        return true;
    }

    let ch_no;
    let slot_no;

    // busy on RF?
    if state.rf_state != RfState::Listening && state.rf_state != RfState::Data {
        if !net {
            warn!(
                "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), voice call denied, traffic in progress, dstId = {dst_id}",
                state.slot_no
            );
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            activity_log(
                true,
                &format!(
                    "Slot {} group grant request {src_id} to TG {dst_id} denied",
                    state.slot_no
                ),
            );
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    // busy on the network with a conflicting destination?
    if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
        if !net {
            warn!(
                "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), voice call denied, traffic in progress, dstId = {dst_id}",
                state.slot_no
            );
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            activity_log(
                true,
                &format!(
                    "Slot {} group grant request {src_id} to TG {dst_id} denied",
                    state.slot_no
                ),
            );
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    // TG hang holds the slot for the last destination
    if state.rf_last_dst_id != 0
        && state.rf_last_dst_id != dst_id
        && state.rf_tg_hang.is_running()
        && !state.rf_tg_hang.has_expired()
    {
        if !net {
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    if !io.site.affiliations.is_granted(dst_id) {
        if !io.site.affiliations.is_rf_ch_available() {
            if !net {
                warn!(
                    "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), voice call queued, no channels available, dstId = {dst_id}",
                    state.slot_no
                );
                write_ack_rsp(state, io, src_id, TS_QUEUED_RSN_NO_RESOURCE, u8::from(grp));
                activity_log(
                    true,
                    &format!(
                        "Slot {} group grant request {src_id} to TG {dst_id} queued",
                        state.slot_no
                    ),
                );
                state.rf_state = RfState::Rejected;
            }
            return false;
        }

        if !io.site.affiliations.grant_ch(dst_id, src_id, net) {
            return false;
        }
        ch_no = io.site.affiliations.granted_ch(dst_id).unwrap_or(0);
        slot_no = io.site.affiliations.granted_slot(dst_id).unwrap_or(1);
    } else {
        // collision check: is this a grant retry, or a different source?
        let granted_src_id = io.site.affiliations.granted_src_id(dst_id).unwrap_or(0);
        if src_id != granted_src_id {
            debug!(
                "DMR Slot {}, grant collision, dstId = {dst_id}, granted srcId = {granted_src_id}, requesting srcId = {src_id}",
                state.slot_no
            );
            if !state.cfg.disable_grant_src_id_check && !net {
                warn!(
                    "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), voice call denied, traffic in progress, dstId = {dst_id}",
                    state.slot_no
                );
                write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
                activity_log(
                    true,
                    &format!(
                        "Slot {} group grant request {src_id} to TG {dst_id} denied",
                        state.slot_no
                    ),
                );
                state.rf_state = RfState::Rejected;
                return false;
            }
        }

        ch_no = io.site.affiliations.granted_ch(dst_id).unwrap_or(0);
        slot_no = io.site.affiliations.granted_slot(dst_id).unwrap_or(1);
        io.site.affiliations.touch_grant(dst_id);
    }

    if !net {
        activity_log(
            true,
            &format!(
                "Slot {} {} grant request from {src_id} to TG {dst_id}",
                state.slot_no,
                if grp { "group" } else { "individual" }
            ),
        );
    }

    // permit the granted TG for use on the voice channel
    if state.cfg.authoritative && state.supervisor {
        if let Some(ch_data) = io.site.affiliations.rf_ch_data(ch_no).cloned() {
            if ch_data.is_valid() {
                let req = PermitTgRequest {
                    state: 1,
                    dst_id,
                    slot: slot_no,
                };
                if io.chan_ctrl.permit_tg(&ch_data, &req).is_err() {
                    warn!(
                        "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), failed to permit TG for use, chNo = {ch_no}, slot = {slot_no}",
                        state.slot_no
                    );
                    io.site.affiliations.release_grant(dst_id, false);
                    if !net {
                        write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
                        state.rf_state = RfState::Rejected;
                    }
                    return false;
                }
            }
        }
    }

    write_ack_rsp(state, io, src_id, TS_ACK_RSN_MSG, u8::from(grp));

    let csbk = if grp {
        Csbk::TvGrant {
            broadcast,
            logical_ch: ch_no as u16,
            slot_no,
            late_entry: false,
            emergency,
            src_id,
            dst_id,
        }
    } else {
        Csbk::PvGrant {
            logical_ch: ch_no as u16,
            slot_no,
            emergency,
            src_id,
            dst_id,
        }
    };

    // transmit the grant twice
    write_csbk(state, &csbk);
    write_csbk(state, &csbk);

    activate_payload(state, io, ch_no, slot_no, dst_id, src_id, grp, true);
    true
}

/// The data grant arbitration ladder.
pub fn write_data_grant(
    state: &mut SlotState,
    io: &mut SlotIo,
    src_id: u32,
    dst_id: u32,
    service_options: u8,
    grp: bool,
    net: bool,
) -> bool {
    let emergency = service_options & 0x80 == 0x80;

    if dst_id == WUID_ALL {
        return true;
    }

    if state.rf_state != RfState::Listening && state.rf_state != RfState::Data {
        if !net {
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            activity_log(
                true,
                &format!(
                    "Slot {} group grant request {src_id} to TG {dst_id} denied",
                    state.slot_no
                ),
            );
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
        if !net {
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    if state.rf_last_dst_id != 0
        && state.rf_last_dst_id != dst_id
        && state.rf_tg_hang.is_running()
        && !state.rf_tg_hang.has_expired()
    {
        if !net {
            write_ack_rsp(state, io, src_id, TS_DENY_RSN_TGT_BUSY, u8::from(grp));
            state.rf_state = RfState::Rejected;
        }
        return false;
    }

    let ch_no;
    let slot_no;
    if !io.site.affiliations.is_granted(dst_id) {
        if !io.site.affiliations.is_rf_ch_available() {
            if !net {
                warn!(
                    "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), data call queued, no channels available, dstId = {dst_id}",
                    state.slot_no
                );
                write_ack_rsp(state, io, src_id, TS_QUEUED_RSN_NO_RESOURCE, u8::from(grp));
                activity_log(
                    true,
                    &format!(
                        "Slot {} group grant request {src_id} to TG {dst_id} queued",
                        state.slot_no
                    ),
                );
                state.rf_state = RfState::Rejected;
            }
            return false;
        }

        if !io.site.affiliations.grant_ch(dst_id, src_id, net) {
            return false;
        }
        ch_no = io.site.affiliations.granted_ch(dst_id).unwrap_or(0);
        slot_no = io.site.affiliations.granted_slot(dst_id).unwrap_or(1);
    } else {
        ch_no = io.site.affiliations.granted_ch(dst_id).unwrap_or(0);
        slot_no = io.site.affiliations.granted_slot(dst_id).unwrap_or(1);
        io.site.affiliations.touch_grant(dst_id);
    }

    if !net {
        activity_log(
            true,
            &format!(
                "Slot {} {} grant request from {src_id} to TG {dst_id}",
                state.slot_no,
                if grp { "group" } else { "individual" }
            ),
        );
    }

    write_ack_rsp(state, io, src_id, TS_ACK_RSN_MSG, u8::from(grp));

    let csbk = if grp {
        Csbk::TdGrant {
            logical_ch: ch_no as u16,
            slot_no,
            emergency,
            src_id,
            dst_id,
        }
    } else {
        Csbk::PdGrant {
            logical_ch: ch_no as u16,
            slot_no,
            emergency,
            src_id,
            dst_id,
        }
    };

    write_csbk(state, &csbk);
    write_csbk(state, &csbk);

    activate_payload(state, io, ch_no, slot_no, dst_id, src_id, grp, false);
    true
}

/// Activate the granted payload channel, locally or over the admin surface.
#[allow(clippy::too_many_arguments)]
fn activate_payload(
    state: &mut SlotState,
    io: &mut SlotIo,
    ch_no: u32,
    slot_no: u8,
    dst_id: u32,
    src_id: u32,
    grp: bool,
    voice: bool,
) {
    if ch_no != io.site.channel_no {
        if let Some(ch_data) = io.site.affiliations.rf_ch_data(ch_no).cloned() {
            if ch_data.is_valid() {
                let req = PayloadActRequest {
                    dst_id,
                    src_id,
                    slot: slot_no,
                    group: grp,
                    voice,
                };
                if io.chan_ctrl.payload_activate(&ch_data, &req).is_err() {
                    warn!(
                        "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), failed to activate payload channel, chNo = {ch_no}, slot = {slot_no}",
                        state.slot_no
                    );
                }
                return;
            }
        }
        warn!(
            "DMR Slot {}, DT_CSBK, CSBKO_RAND (Random Access), failed to activate payload channel, chNo = {ch_no}, slot = {slot_no}",
            state.slot_no
        );
    } else {
        io.site.actions.push(SlotAction::ActivatePayload {
            slot_no,
            dst_id,
            src_id,
            group: grp,
            voice,
        });
    }
}

/// Unit registration / de-registration response.
pub fn write_unit_reg_rsp(state: &mut SlotState, io: &mut SlotIo, src_id: u32, service_options: u8) {
    let dereg = service_options & 0x01 == 0x01;

    let mut reason = TS_ACK_RSN_REG;

    if dereg {
        info!(
            "DMR Slot {}, DT_CSBK, unit de-registration, srcId = {src_id}",
            state.slot_no
        );
        io.site.affiliations.unit_dereg(src_id);
    } else {
        if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
            warn!(
                "DMR Slot {}, DT_CSBK, unit registration denial, RID rejection, srcId = {src_id}",
                state.slot_no
            );
            activity_log(
                true,
                &format!("unit registration request from {src_id} denied"),
            );
            reason = TS_DENY_RSN_REG_DENIED;
        }

        if reason == TS_ACK_RSN_REG {
            activity_log(true, &format!("unit registration request from {src_id}"));
            if !io.site.affiliations.is_unit_reg(src_id) {
                io.site.affiliations.unit_reg(src_id);
            }
        }
    }

    let csbk = Csbk::AckRsp {
        response: 0,
        reason,
        src_id: WUID_REGI,
        dst_id: src_id,
    };
    write_csbk(state, &csbk);
}

/// Rotating late-entry grant advertisement.
pub fn write_grant_late_entry(state: &mut SlotState, io: &mut SlotIo, dst_id: u32, src_id: u32) {
    let ch_no = io.site.affiliations.granted_ch(dst_id).unwrap_or(0);
    let slot_no = io.site.affiliations.granted_slot(dst_id).unwrap_or(1);

    let csbk = Csbk::TvGrant {
        broadcast: false,
        logical_ch: ch_no as u16,
        slot_no,
        late_entry: true,
        emergency: false,
        src_id,
        dst_id,
    };
    write_csbk(state, &csbk);
}

/// Grant advertisement a payload slot repeats while waiting for traffic.
pub fn write_payload_grant(state: &mut SlotState, io: &mut SlotIo) {
    if state.tscc_payload_dst_id == 0 {
        return;
    }

    let grp = state.tscc_payload_group;
    let voice = state.tscc_payload_voice;
    let src_id = state.tscc_payload_src_id;
    let dst_id = state.tscc_payload_dst_id;
    let logical_ch = io.site.channel_no as u16;
    let slot_no = state.slot_no;

    let csbk = match (voice, grp) {
        (true, true) => Csbk::TvGrant {
            broadcast: false,
            logical_ch,
            slot_no,
            late_entry: false,
            emergency: false,
            src_id,
            dst_id,
        },
        (true, false) => Csbk::PvGrant {
            logical_ch,
            slot_no,
            emergency: false,
            src_id,
            dst_id,
        },
        (false, true) => Csbk::TdGrant {
            logical_ch,
            slot_no,
            emergency: false,
            src_id,
            dst_id,
        },
        (false, false) => Csbk::PdGrant {
            logical_ch,
            slot_no,
            emergency: false,
            src_id,
            dst_id,
        },
    };

    write_csbk(state, &csbk);
}

/* TSCC beacon generation */

/// Aloha random-access invitation.
pub fn write_tscc_aloha(state: &mut SlotState, io: &mut SlotIo) {
    let csbk = Csbk::Aloha {
        n_rand_wait: state.cfg.n_rand_wait,
        backoff: state.cfg.back_off,
        system_identity: io.site.data.system_identity(),
    };
    write_csbk(state, &csbk);
}

/// Site parameters broadcast.
pub fn write_tscc_bcast_sys_parm(state: &mut SlotState, io: &mut SlotIo) {
    let csbk = Csbk::Broadcast {
        annc_type: BCAST_ANNC_SITE_PARMS,
        system_identity: io.site.data.system_identity(),
        require_reg: io.site.data.require_reg(),
        backoff: state.cfg.back_off,
        logical_ch1: 0,
        ann_wd1: false,
    };
    write_csbk(state, &csbk);
}

/// Announce/withdraw TSCC channel broadcast.
pub fn write_tscc_bcast_ann_wd(state: &mut SlotState, io: &mut SlotIo, ch_no: u32, ann_wd: bool) {
    state.rf_seq_no = 0;

    let csbk = Csbk::Broadcast {
        annc_type: BCAST_ANNC_ANN_WD_TSCC,
        system_identity: io.site.data.system_identity(),
        require_reg: io.site.data.require_reg(),
        backoff: state.cfg.back_off,
        logical_ch1: ch_no as u16,
        ann_wd1: ann_wd,
    };
    write_csbk(state, &csbk);
}

/// Build identification beacon.
pub fn write_tscc_git_hash(state: &mut SlotState) {
    let csbk = Csbk::GitHash { hash: BUILD_HASH };
    write_csbk(state, &csbk);
}

/// One TSCC beacon tick: pick and emit the control message for `seq`.
pub fn write_control_data(state: &mut SlotState, frame_cnt: u16, seq: u8, io: &mut SlotIo) {
    if !state.enable_tscc {
        return;
    }

    // don't add any frames if the queue is full
    if state.queue.free_space() < FRAME_LENGTH_BYTES + 3 {
        state.cc_seq = state.cc_seq.saturating_sub(1);
        return;
    }

    // identification ping replaces the scheduled beacon
    if frame_cnt % 256 == 0 {
        write_tscc_git_hash(state);
        return;
    }

    match seq {
        3 => {
            let grants = io.site.affiliations.grant_table();
            if !grants.is_empty() {
                if state.last_late_entry >= grants.len() {
                    state.last_late_entry = 0;
                }
                let (dst_id, _) = grants[state.last_late_entry];
                let src_id = io.site.affiliations.granted_src_id(dst_id).unwrap_or(0);

                debug!(
                    "write_control_data, frameCnt = {frame_cnt}, seq = {seq}, late entry, dstId = {dst_id}, srcId = {src_id}"
                );

                write_grant_late_entry(state, io, dst_id, src_id);
                state.last_late_entry += 1;
            } else {
                write_tscc_bcast_sys_parm(state, io);
            }
        }
        2 => {
            let ch_no = io.site.channel_no;
            write_tscc_bcast_ann_wd(state, io, ch_no, true);
        }
        1 => write_tscc_aloha(state, io),
        _ => write_tscc_bcast_sys_parm(state, io),
    }
}

/// Extended function write for the admin surface.
pub fn write_ext_func(state: &mut SlotState, function: u16, arg: u32, dst_id: u32) {
    let csbk = Csbk::ExtFnct {
        function,
        src_id: arg,
        dst_id,
    };

    info!(
        "DMR Slot {}, DT_CSBK, {}, op = ${function:02X}, arg = {arg}, tgt = {dst_id}",
        state.slot_no,
        csbk.name()
    );

    match function {
        EXT_FNCT_CHECK => activity_log(
            true,
            &format!(
                "Slot {} radio check request from {arg} to {dst_id}",
                state.slot_no
            ),
        ),
        EXT_FNCT_INHIBIT => activity_log(
            true,
            &format!(
                "Slot {} radio inhibit request from {arg} to {dst_id}",
                state.slot_no
            ),
        ),
        EXT_FNCT_UNINHIBIT => activity_log(
            true,
            &format!(
                "Slot {} radio uninhibit request from {arg} to {dst_id}",
                state.slot_no
            ),
        ),
        _ => {}
    }

    write_csbk(state, &csbk);
}

/// Call alert write for the admin surface.
pub fn write_call_alert(state: &mut SlotState, src_id: u32, dst_id: u32) {
    let csbk = Csbk::CallAlert { src_id, dst_id };

    activity_log(
        true,
        &format!(
            "Slot {} call alert request from {src_id} to {dst_id}",
            state.slot_no
        ),
    );

    write_csbk(state, &csbk);
}

/// Log the activity line for an extended-function block.
fn log_ext_function(slot_no: u8, rf: bool, function: u16, arg: u32, tgt: u32) {
    let event = match function {
        EXT_FNCT_CHECK => "radio check request",
        EXT_FNCT_INHIBIT => "radio inhibit request",
        EXT_FNCT_UNINHIBIT => "radio uninhibit request",
        EXT_FNCT_CHECK_ACK => "radio check response",
        EXT_FNCT_INHIBIT_ACK => "radio inhibit response",
        EXT_FNCT_UNINHIBIT_ACK => "radio uninhibit response",
        _ => {
            warn!("DMR Slot {slot_no}, DT_CSBK, unhandled op, op = ${function:02X}");
            return;
        }
    };
    activity_log(rf, &format!("Slot {slot_no} {event} from {arg} to {tgt}"));
}
