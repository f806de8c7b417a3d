//! Voice packet handling for a slot: headers, superframes, embedded data,
//! late entry, silence fill and network jitter repair.

use log::{info, warn};

use crate::defines::*;
use crate::edac::ambe_fec;
use crate::frame::{emb::Emb, slot_type::SlotType, sync, EmbeddedData};
use crate::lc::{full_lc, Lc, PrivacyLc};
use crate::logging::activity_log;
use crate::lookups::AccessControl;
use crate::network::NetData;
use crate::slot::{NetState, RfState, SlcoActType, SlotIo, SlotState, TalkerId};

/// Voice-path scratch state: embedded-LC accumulators and the last-frame
/// buffer used for silence synthesis.
pub struct Voice {
    last_frame: [u8; FRAME_LENGTH_BYTES + 2],
    last_frame_valid: bool,
    rf_embedded_lc: EmbeddedData,
    rf_embedded_data: [EmbeddedData; 2],
    rf_embedded_read_n: usize,
    rf_embedded_write_n: usize,
    net_embedded_lc: EmbeddedData,
    net_embedded_data: [EmbeddedData; 2],
    net_embedded_read_n: usize,
    net_embedded_write_n: usize,
}

impl Voice {
    pub fn new() -> Self {
        Voice {
            last_frame: [0u8; FRAME_LENGTH_BYTES + 2],
            last_frame_valid: false,
            rf_embedded_lc: EmbeddedData::new(),
            rf_embedded_data: [EmbeddedData::new(), EmbeddedData::new()],
            rf_embedded_read_n: 0,
            rf_embedded_write_n: 1,
            net_embedded_lc: EmbeddedData::new(),
            net_embedded_data: [EmbeddedData::new(), EmbeddedData::new()],
            net_embedded_read_n: 0,
            net_embedded_write_n: 1,
        }
    }

    /// Process a voice-path burst from the RF interface.
    pub fn process(&mut self, state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
        let data_sync = (frame[1] & SYNC_DATA) == SYNC_DATA;
        let voice_sync = (frame[1] & SYNC_VOICE) == SYNC_VOICE;

        if data_sync {
            let data_type = DataType::from_bits(frame[1]);
            return match data_type {
                DataType::VoiceLcHeader => self.process_header(state, frame, io),
                DataType::VoicePiHeader => self.process_pi_header(state, frame, io),
                _ => false,
            };
        }

        if voice_sync {
            if state.rf_state == RfState::Audio {
                return self.process_audio_sync(state, frame, io);
            }
            if state.rf_state == RfState::Listening {
                self.rf_embedded_lc.reset();
                state.rf_state = RfState::LateEntry;
            }
            return false;
        }

        match state.rf_state {
            RfState::Audio => self.process_audio(state, frame, io),
            RfState::LateEntry => self.process_late_entry(state, frame, io),
            _ => false,
        }
    }

    fn process_header(&mut self, state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
        if state.rf_state == RfState::Audio {
            return true;
        }

        let lc = match full_lc::decode(&frame[2..], DataType::VoiceLcHeader) {
            Some(lc) => lc,
            None => return false,
        };

        let src_id = lc.src_id;
        let dst_id = lc.dst_id;
        let group = lc.is_group();

        if !check_authoritative(state, dst_id) {
            return false;
        }
        if !check_traffic_collision(state, dst_id, io) {
            return false;
        }

        if state.tscc_payload_dst_id != 0 && state.tscc_payload_act_retry.is_running() {
            state.tscc_payload_act_retry.stop();
        }

        if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
            warn!(
                "DMR Slot {}, VOICE_LC_HEADER denial, RID rejection, srcId = {src_id}",
                state.slot_no
            );
            activity_log(
                true,
                &format!(
                    "Slot {} RF voice rejection from {} to {}{}",
                    state.slot_no,
                    src_id,
                    if group { "TG " } else { "" },
                    dst_id
                ),
            );
            state.rf_last_dst_id = 0;
            state.rf_last_src_id = 0;
            state.rf_tg_hang.stop();
            state.rf_state = RfState::Rejected;
            return false;
        }

        if group && !AccessControl::validate_tg_id(io.tg_lookup, state.slot_no, dst_id) {
            warn!(
                "DMR Slot {}, VOICE_LC_HEADER denial, TGID rejection, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no
            );
            activity_log(
                true,
                &format!(
                    "Slot {} RF voice rejection from {} to TG {}",
                    state.slot_no, src_id, dst_id
                ),
            );
            state.rf_last_dst_id = 0;
            state.rf_last_src_id = 0;
            state.rf_tg_hang.stop();
            state.rf_state = RfState::Rejected;
            return false;
        }

        // a feature ID with the enhanced-privacy bit marks an encrypted call
        let encrypted = (lc.fid & 0x10) == 0x10;

        state.rf_lc = Some(lc);

        // standby LC for fragment substitution
        self.rf_embedded_lc.set_lc(&lc);
        self.rf_embedded_data[0].set_lc(&lc);
        self.rf_embedded_data[1].set_lc(&lc);

        // regenerate the header fields
        full_lc::encode(&lc, &mut frame[2..], DataType::VoiceLcHeader);
        SlotType::new(state.cfg.color_code, DataType::VoiceLcHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        state.rf_timeout_timer.start();
        state.rf_timeout = false;
        state.rf_frames = 0;
        state.rf_seq_no = 0;
        state.rf_bits = 1;
        state.rf_errs = 0;
        state.last_rf_n = 0;

        self.rf_embedded_read_n = 0;
        self.rf_embedded_write_n = 1;
        state.rf_talker_id = TalkerId::empty();

        state.min_rssi = state.rssi;
        state.max_rssi = state.rssi;
        state.ave_rssi = u32::from(state.rssi);
        state.rssi_count = 1;

        if state.cfg.duplex {
            state.queue.clear();
            io.modem.abort_tx(state.slot_no);

            for _ in 0..NO_HEADERS_DUPLEX {
                state.add_frame(frame, false);
            }
        }

        state.write_network(frame, DataType::VoiceLcHeader, 0, io);

        state.rf_state = RfState::Audio;
        state.rf_last_dst_id = dst_id;
        state.rf_last_src_id = src_id;

        if state.net_state == NetState::Idle {
            state.set_short_lc(state.slot_no, dst_id, lc.flco, SlcoActType::Voice, io);
        }

        activity_log(
            true,
            &format!(
                "Slot {} RF {}voice header from {} to {}{}",
                state.slot_no,
                if encrypted { "encrypted " } else { "" },
                src_id,
                if group { "TG " } else { "" },
                dst_id
            ),
        );
        true
    }

    fn process_pi_header(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8],
        io: &mut SlotIo,
    ) -> bool {
        if state.rf_state != RfState::Audio {
            return false;
        }

        let pi = match full_lc::decode_pi(&frame[2..]) {
            Some(pi) => pi,
            None => {
                warn!(
                    "DMR Slot {}, VOICE_PI_HEADER, bad LC received, replacing",
                    state.slot_no
                );
                let dst_id = state.rf_lc.map(|lc| lc.dst_id).unwrap_or(0);
                PrivacyLc::new(dst_id)
            }
        };

        state.rf_privacy_lc = Some(pi);

        full_lc::encode_pi(&pi, &mut frame[2..]);
        SlotType::new(state.cfg.color_code, DataType::VoicePiHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        if state.cfg.duplex {
            state.add_frame(frame, false);
        }
        state.write_network(frame, DataType::VoicePiHeader, 0, io);

        info!(
            "DMR Slot {}, VOICE_PI_HEADER, algId = {}, kId = {}, dstId = {}",
            state.slot_no, pi.alg_id, pi.key_id, pi.dst_id
        );
        true
    }

    fn process_audio_sync(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8],
        io: &mut SlotIo,
    ) -> bool {
        state.last_rf_n = 0;
        state.rf_n = 0;

        sync::add_voice_sync(&mut frame[2..], state.cfg.duplex);

        let mut errors = 0u32;
        let fid = state.rf_lc.map(|lc| lc.fid).unwrap_or(FID_ETSI);
        if fid == FID_ETSI || fid == FID_DMRA {
            errors = ambe_fec::regenerate(&mut frame[2..]);

            if errors > state.cfg.silence_threshold {
                insert_null_audio(&mut frame[2..]);
                ambe_fec::regenerate(&mut frame[2..]);
                warn!("DMR Slot {}, VOICE_SYNC, exceeded lost audio threshold, filling in", state.slot_no);
            }

            state.rf_errs += errors;
        }

        state.rf_bits += MAX_VOICE_ERRORS;
        state.rf_frames += 1;

        state.rf_tg_hang.start();
        state.net_tg_hang.stop();
        if let Some(lc) = state.rf_lc {
            state.rf_last_dst_id = lc.dst_id;
            state.rf_last_src_id = lc.src_id;
        }

        self.rf_embedded_read_n = (self.rf_embedded_read_n + 1) % 2;
        self.rf_embedded_write_n = (self.rf_embedded_write_n + 1) % 2;
        self.rf_embedded_data[self.rf_embedded_write_n].reset();

        if !state.rf_timeout {
            frame[0] = TAG_DATA;
            frame[1] = 0x00;

            if state.cfg.duplex {
                state.add_frame(frame, false);
            }
            state.write_network(frame, DataType::VoiceSync, errors as u8, io);
            return true;
        }

        false
    }

    fn process_audio(&mut self, state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
        state.rf_n = frame[1] & 0x0F;

        // superframe ordering: drop repeats and out-of-order frames
        if state.rf_n > 5 {
            return false;
        }
        if state.rf_n == state.last_rf_n {
            return false;
        }
        if state.rf_n != state.last_rf_n + 1 {
            return false;
        }
        state.last_rf_n = state.rf_n;

        let mut errors = 0u32;
        let fid = state.rf_lc.map(|lc| lc.fid).unwrap_or(FID_ETSI);
        if fid == FID_ETSI || fid == FID_DMRA {
            errors = ambe_fec::regenerate(&mut frame[2..]);

            if errors > state.cfg.silence_threshold {
                // hold on to the received EMB while replacing the audio
                let emb = Emb::decode(&frame[2..]).unwrap_or_default();
                insert_null_audio(&mut frame[2..]);
                ambe_fec::regenerate(&mut frame[2..]);
                emb.encode(&mut frame[2..]);

                warn!("DMR Slot {}, VOICE, exceeded lost audio threshold, filling in", state.slot_no);
            }

            state.rf_errs += errors;
        }

        state.rf_bits += MAX_VOICE_ERRORS;
        state.rf_frames += 1;

        state.rf_tg_hang.start();
        state.net_tg_hang.stop();
        if let Some(lc) = state.rf_lc {
            state.rf_last_dst_id = lc.dst_id;
            state.rf_last_src_id = lc.src_id;
        }

        let mut lcss = match Emb::decode(&frame[2..]) {
            Some(emb) => emb.lcss,
            None => 0,
        };

        // collect any interesting embedded data
        if self.rf_embedded_data[self.rf_embedded_write_n].add_data(&frame[2..], lcss) {
            let write_n = self.rf_embedded_write_n;
            let talker_id = &mut state.rf_talker_id;
            log_embedded_data(
                state.slot_no,
                state.cfg.dump_ta_data,
                &self.rf_embedded_data[write_n],
                talker_id,
                state.rf_lc.map(|lc| lc.src_id).unwrap_or(0),
            );
        }

        // regenerate the previous superframe's embedded data, or substitute
        // the call LC for it
        if self.rf_embedded_data[self.rf_embedded_read_n].is_valid() {
            lcss = self.rf_embedded_data[self.rf_embedded_read_n].get_data(&mut frame[2..], state.rf_n);
        } else {
            lcss = self.rf_embedded_lc.get_data(&mut frame[2..], state.rf_n);
        }

        let mut emb = Emb::decode(&frame[2..]).unwrap_or_default();
        emb.color_code = state.cfg.color_code;
        emb.lcss = lcss;
        emb.encode(&mut frame[2..]);

        if !state.rf_timeout {
            frame[0] = TAG_DATA;
            frame[1] = 0x00;

            state.write_network(frame, DataType::Voice, errors as u8, io);

            if state.cfg.embedded_lc_only {
                // only ever emit the call LC
                let lcss = self.rf_embedded_lc.get_data(&mut frame[2..], state.rf_n);
                let mut emb = Emb::decode(&frame[2..]).unwrap_or_default();
                emb.color_code = state.cfg.color_code;
                emb.lcss = lcss;
                emb.encode(&mut frame[2..]);
            }

            if state.cfg.duplex {
                state.add_frame(frame, false);
            }

            return true;
        }

        false
    }

    fn process_late_entry(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8],
        io: &mut SlotIo,
    ) -> bool {
        let emb = match Emb::decode(&frame[2..]) {
            Some(emb) => emb,
            None => return false,
        };

        // without an LC yet, be strict on the color code
        if emb.color_code != state.cfg.color_code {
            return false;
        }

        self.rf_embedded_lc.add_data(&frame[2..], emb.lcss);
        let lc = match self.rf_embedded_lc.lc() {
            Some(lc) => lc,
            None => return false,
        };

        let src_id = lc.src_id;
        let dst_id = lc.dst_id;
        let group = lc.is_group();

        if !check_authoritative(state, dst_id) {
            return false;
        }
        if !check_traffic_collision(state, dst_id, io) {
            return false;
        }

        if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
            warn!(
                "DMR Slot {}, VOICE denial, RID rejection, srcId = {src_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }

        if group && !AccessControl::validate_tg_id(io.tg_lookup, state.slot_no, dst_id) {
            warn!(
                "DMR Slot {}, VOICE denial, TGID rejection, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }

        state.rf_lc = Some(lc);

        self.rf_embedded_lc.set_lc(&lc);
        self.rf_embedded_data[0].set_lc(&lc);
        self.rf_embedded_data[1].set_lc(&lc);

        // synthesize the start frame the repeater never heard
        let mut start = [0u8; FRAME_LENGTH_BYTES + 2];
        sync::add_data_sync(&mut start[2..], state.cfg.duplex);
        full_lc::encode(&lc, &mut start[2..], DataType::VoiceLcHeader);
        SlotType::new(state.cfg.color_code, DataType::VoiceLcHeader).encode(&mut start[2..]);
        start[0] = TAG_DATA;
        start[1] = 0x00;

        state.rf_timeout_timer.start();
        state.rf_timeout = false;
        state.rf_frames = 0;
        state.rf_seq_no = 0;
        state.rf_bits = 1;
        state.rf_errs = 0;

        self.rf_embedded_read_n = 0;
        self.rf_embedded_write_n = 1;
        state.rf_talker_id = TalkerId::empty();

        state.min_rssi = state.rssi;
        state.max_rssi = state.rssi;
        state.ave_rssi = u32::from(state.rssi);
        state.rssi_count = 1;

        if state.cfg.duplex {
            state.queue.clear();
            io.modem.abort_tx(state.slot_no);

            for _ in 0..NO_HEADERS_DUPLEX {
                state.add_frame(&start, false);
            }
        }

        state.write_network(&start, DataType::VoiceLcHeader, 0, io);

        state.rf_n = frame[1] & 0x0F;
        if state.rf_n > 5 {
            return false;
        }
        if state.rf_n == state.last_rf_n {
            return false;
        }
        state.last_rf_n = state.rf_n;

        emb.encode(&mut frame[2..]);

        // pass the original audio frame along
        let mut errors = 0u32;
        if lc.fid == FID_ETSI || lc.fid == FID_DMRA {
            errors = ambe_fec::regenerate(&mut frame[2..]);
            if errors > state.cfg.silence_threshold {
                let emb = Emb::decode(&frame[2..]).unwrap_or_default();
                insert_null_audio(&mut frame[2..]);
                ambe_fec::regenerate(&mut frame[2..]);
                emb.encode(&mut frame[2..]);
                warn!("DMR Slot {}, VOICE, exceeded lost audio threshold, filling in", state.slot_no);
            }
            state.rf_errs += errors;
        }

        state.rf_bits += MAX_VOICE_ERRORS;
        state.rf_frames += 1;

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        if state.cfg.duplex {
            state.add_frame(frame, false);
        }

        state.write_network(frame, DataType::Voice, errors as u8, io);

        state.rf_state = RfState::Audio;
        state.rf_tg_hang.start();
        state.net_tg_hang.stop();
        state.rf_last_dst_id = dst_id;
        state.rf_last_src_id = src_id;

        if state.net_state == NetState::Idle {
            state.set_short_lc(state.slot_no, dst_id, lc.flco, SlcoActType::Voice, io);
        }

        activity_log(
            true,
            &format!(
                "Slot {} RF late entry from {} to {}{}",
                state.slot_no,
                src_id,
                if group { "TG " } else { "" },
                dst_id
            ),
        );
        true
    }

    /// Process a voice-path record from the network.
    pub fn process_network(&mut self, state: &mut SlotState, net_data: &NetData, io: &mut SlotIo) {
        let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
        frame[2..].copy_from_slice(&net_data.payload);

        match net_data.data_type {
            DataType::VoiceLcHeader => self.process_net_header(state, net_data, &mut frame, io),
            DataType::VoicePiHeader => self.process_net_pi(state, net_data, &mut frame, io),
            DataType::VoiceSync => self.process_net_sync(state, net_data, &mut frame, io),
            DataType::Voice => self.process_net_voice(state, net_data, &mut frame),
            _ => {
                warn!(
                    "DMR Slot {}, unhandled network data, type = {:?}",
                    state.slot_no, net_data.data_type
                );
            }
        }
    }

    fn process_net_header(
        &mut self,
        state: &mut SlotState,
        net_data: &NetData,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        io: &mut SlotIo,
    ) {
        if state.net_state == NetState::Audio {
            return;
        }

        let lc = match full_lc::decode(&frame[2..], DataType::VoiceLcHeader) {
            Some(lc) => lc,
            None => {
                warn!(
                    "DMR Slot {}, VOICE_LC_HEADER, bad LC received from the network, replacing",
                    state.slot_no
                );
                let mut lc = Lc::new(net_data.flco, net_data.src_id, net_data.dst_id);
                lc.fid = FID_ETSI;
                lc
            }
        };

        let src_id = lc.src_id;
        let dst_id = lc.dst_id;

        if !check_net_authoritative(state, dst_id) {
            return;
        }
        if !check_net_traffic_collision(state, dst_id) {
            return;
        }

        if state.tscc_payload_dst_id != 0 && state.tscc_payload_act_retry.is_running() {
            state.tscc_payload_act_retry.stop();
        }

        if dst_id != net_data.dst_id || src_id != net_data.src_id || lc.flco != net_data.flco {
            warn!(
                "DMR Slot {}, VOICE_LC_HEADER, header doesn't match the frame addressing: {}->{} {}->{}",
                state.slot_no, net_data.src_id, net_data.dst_id, src_id, dst_id
            );
        }

        state.net_lc = Some(lc);

        self.net_embedded_lc.set_lc(&lc);
        self.net_embedded_data[0].set_lc(&lc);
        self.net_embedded_data[1].set_lc(&lc);

        full_lc::encode(&lc, &mut frame[2..], DataType::VoiceLcHeader);
        SlotType::new(state.cfg.color_code, DataType::VoiceLcHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        self.last_frame_valid = false;

        state.net_timeout_timer.start();
        state.net_timeout = false;
        state.net_frames = 0;
        state.net_lost = 0;
        state.net_bits = 1;
        state.net_errs = 0;

        self.net_embedded_read_n = 0;
        self.net_embedded_write_n = 1;
        state.net_talker_id = TalkerId::empty();

        if state.cfg.duplex {
            state.queue.clear();
            io.modem.abort_tx(state.slot_no);
        }

        // absorb network jitter before the headers
        let idle = state.idle;
        for _ in 0..state.cfg.jitter_slots() {
            state.add_frame(&idle, true);
        }

        let headers = if state.cfg.duplex {
            NO_HEADERS_DUPLEX
        } else {
            NO_HEADERS_SIMPLEX
        };
        for _ in 0..headers {
            state.add_frame(frame, true);
        }

        state.net_state = NetState::Audio;
        state.net_last_dst_id = dst_id;
        state.net_last_src_id = src_id;
        state.net_tg_hang.start();
        state.net_elapsed_ms = 0;
        state.packet_timer.start();

        state.set_short_lc(state.slot_no, dst_id, lc.flco, SlcoActType::Voice, io);

        activity_log(
            false,
            &format!(
                "Slot {} network voice header from {} to {}{}",
                state.slot_no,
                src_id,
                if lc.is_group() { "TG " } else { "" },
                dst_id
            ),
        );
    }

    fn process_net_pi(
        &mut self,
        state: &mut SlotState,
        net_data: &NetData,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        io: &mut SlotIo,
    ) {
        if state.net_state != NetState::Audio {
            // late entry by PI header
            let lc = Lc::new(net_data.flco, net_data.src_id, net_data.dst_id);
            let dst_id = lc.dst_id;

            if !check_net_authoritative(state, dst_id) {
                return;
            }
            if !check_net_traffic_collision(state, dst_id) {
                return;
            }

            state.net_lc = Some(lc);
            self.late_entry_net_start(state, &lc, io);
        }

        let pi = match full_lc::decode_pi(&frame[2..]) {
            Some(pi) => pi,
            None => {
                warn!(
                    "DMR Slot {}, VOICE_PI_HEADER, bad LC received, replacing",
                    state.slot_no
                );
                PrivacyLc::new(net_data.dst_id)
            }
        };

        state.net_privacy_lc = Some(pi);

        full_lc::encode_pi(&pi, &mut frame[2..]);
        SlotType::new(state.cfg.color_code, DataType::VoicePiHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        state.add_frame(frame, true);

        info!(
            "DMR Slot {}, VOICE_PI_HEADER, algId = {}, kId = {}, dstId = {}",
            state.slot_no, pi.alg_id, pi.key_id, pi.dst_id
        );
    }

    fn process_net_sync(
        &mut self,
        state: &mut SlotState,
        net_data: &NetData,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        io: &mut SlotIo,
    ) {
        if state.net_state == NetState::Idle {
            let lc = Lc::new(net_data.flco, net_data.src_id, net_data.dst_id);

            if !check_net_authoritative(state, lc.dst_id) {
                return;
            }

            state.net_lc = Some(lc);

            self.net_embedded_lc.set_lc(&lc);
            self.net_embedded_data[0].set_lc(&lc);
            self.net_embedded_data[1].set_lc(&lc);
            self.net_embedded_read_n = 0;
            self.net_embedded_write_n = 1;
            state.net_talker_id = TalkerId::empty();

            self.late_entry_net_start(state, &lc, io);
        }

        if state.net_state != NetState::Audio {
            return;
        }

        let fid = state.net_lc.map(|lc| lc.fid).unwrap_or(FID_ETSI);
        if fid == FID_ETSI || fid == FID_DMRA {
            state.net_errs += ambe_fec::regenerate(&mut frame[2..]);
        }
        if state.net_n >= 5 {
            state.net_errs = 0;
        }
        state.net_bits += MAX_VOICE_ERRORS;

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        sync::add_voice_sync(&mut frame[2..], state.cfg.duplex);

        if state.net_frames == 0 {
            self.last_frame.copy_from_slice(frame);
            self.last_frame_valid = true;
            state.net_n = 5;
            state.net_lost = 0;
        }

        if !state.net_timeout {
            state.add_frame(frame, true);
        }

        self.net_embedded_read_n = (self.net_embedded_read_n + 1) % 2;
        self.net_embedded_write_n = (self.net_embedded_write_n + 1) % 2;
        self.net_embedded_data[self.net_embedded_write_n].reset();

        state.packet_timer.start();
        state.net_elapsed_ms = 0;
        state.net_frames += 1;
        state.net_tg_hang.start();

        state.net_n = net_data.n;
    }

    fn process_net_voice(
        &mut self,
        state: &mut SlotState,
        net_data: &NetData,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
    ) {
        if state.net_state != NetState::Audio {
            return;
        }

        let fid = state.net_lc.map(|lc| lc.fid).unwrap_or(FID_ETSI);
        if fid == FID_ETSI || fid == FID_DMRA {
            state.net_errs += ambe_fec::regenerate(&mut frame[2..]);
        }
        state.net_bits += MAX_VOICE_ERRORS;
        state.net_tg_hang.start();

        let mut lcss = match Emb::decode(&frame[2..]) {
            Some(emb) => emb.lcss,
            None => 0,
        };

        if self.net_embedded_data[self.net_embedded_write_n].add_data(&frame[2..], lcss) {
            let write_n = self.net_embedded_write_n;
            log_embedded_data(
                state.slot_no,
                state.cfg.dump_ta_data,
                &self.net_embedded_data[write_n],
                &mut state.net_talker_id,
                state.net_lc.map(|lc| lc.src_id).unwrap_or(0),
            );
        }

        if state.cfg.embedded_lc_only {
            lcss = self.net_embedded_lc.get_data(&mut frame[2..], net_data.n);
        } else if self.net_embedded_data[self.net_embedded_read_n].is_valid() {
            lcss =
                self.net_embedded_data[self.net_embedded_read_n].get_data(&mut frame[2..], net_data.n);
        } else {
            lcss = self.net_embedded_lc.get_data(&mut frame[2..], net_data.n);
        }

        let mut emb = Emb::decode(&frame[2..]).unwrap_or_default();
        emb.color_code = state.cfg.color_code;
        emb.lcss = lcss;
        emb.encode(&mut frame[2..]);

        frame[0] = TAG_DATA;
        frame[1] = 0x00;

        if state.net_frames == 0 {
            self.last_frame.copy_from_slice(frame);
            self.last_frame_valid = true;
            state.net_n = 5;
            state.net_lost = 0;
        }

        if self.insert_silence_before(state, frame, net_data.n) && !state.net_timeout {
            state.add_frame(frame, true);
        }

        state.packet_timer.start();
        state.net_elapsed_ms = 0;
        state.net_frames += 1;
        state.net_n = net_data.n;
    }

    /// Spin up the TX side for a network call that joined without its header.
    fn late_entry_net_start(&mut self, state: &mut SlotState, lc: &Lc, io: &mut SlotIo) {
        self.last_frame_valid = false;

        state.net_timeout_timer.start();
        state.net_timeout = false;

        if state.cfg.duplex {
            state.queue.clear();
            io.modem.abort_tx(state.slot_no);
        }

        let idle = state.idle;
        for _ in 0..state.cfg.jitter_slots() {
            state.add_frame(&idle, true);
        }

        let mut start = [0u8; FRAME_LENGTH_BYTES + 2];
        sync::add_data_sync(&mut start[2..], state.cfg.duplex);
        full_lc::encode(lc, &mut start[2..], DataType::VoiceLcHeader);
        SlotType::new(state.cfg.color_code, DataType::VoiceLcHeader).encode(&mut start[2..]);
        start[0] = TAG_DATA;
        start[1] = 0x00;

        let headers = if state.cfg.duplex {
            NO_HEADERS_DUPLEX
        } else {
            NO_HEADERS_SIMPLEX
        };
        for _ in 0..headers {
            state.add_frame(&start, true);
        }

        state.net_frames = 0;
        state.net_lost = 0;
        state.net_bits = 1;
        state.net_errs = 0;

        state.net_state = NetState::Audio;
        state.net_last_dst_id = lc.dst_id;
        state.net_last_src_id = lc.src_id;
        state.net_tg_hang.start();
        state.net_elapsed_ms = 0;
        state.packet_timer.start();

        state.set_short_lc(state.slot_no, lc.dst_id, lc.flco, SlcoActType::Voice, io);

        activity_log(
            false,
            &format!(
                "Slot {} network late entry from {} to {}{}",
                state.slot_no,
                lc.src_id,
                if lc.is_group() { "TG " } else { "" },
                lc.dst_id
            ),
        );
    }

    /// Repairs an N-index gap before queueing `frame`; false drops a
    /// duplicate.
    fn insert_silence_before(&mut self, state: &mut SlotState, frame: &[u8], seq_no: u8) -> bool {
        if seq_no == state.net_n {
            return false;
        }

        let expected = (state.net_n + 1) % 6;
        if expected == seq_no {
            self.last_frame.copy_from_slice(&frame[..FRAME_LENGTH_BYTES + 2]);
            self.last_frame_valid = true;
            return true;
        }

        let count = (u32::from(seq_no) + 6 - u32::from(expected)) % 6;
        self.insert_silence(state, count);

        self.last_frame.copy_from_slice(&frame[..FRAME_LENGTH_BYTES + 2]);
        self.last_frame_valid = true;
        true
    }

    /// Synthesizes `count` silence bursts continuing the net N sequence.
    pub fn insert_silence(&mut self, state: &mut SlotState, count: u32) {
        let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];

        if self.last_frame_valid {
            // rebuild a plausible audio burst from the last valid frame
            frame[..2].copy_from_slice(&self.last_frame[..2]);
            let ambe = ambe_fec::extract(&self.last_frame[2..]);
            let mut fill = [0u8; AMBE_LENGTH_BYTES];
            fill[..9].copy_from_slice(&ambe[18..27]);
            fill[9..18].copy_from_slice(&ambe[18..27]);
            fill[18..27].copy_from_slice(&ambe[18..27]);
            ambe_fec::insert(&fill, &mut frame[2..]);
        } else {
            silence_frame(&mut frame);
        }

        let fid = state.net_lc.map(|lc| lc.fid).unwrap_or(FID_ETSI);
        let mut n = (state.net_n + 1) % 6;

        for i in 0..count {
            if (fid == FID_ETSI || fid == FID_DMRA) && i > 0 {
                silence_frame(&mut frame);
                self.last_frame_valid = false;
            }

            if n == 0 {
                sync::add_voice_sync(&mut frame[2..], state.cfg.duplex);
            } else {
                let lcss = self.net_embedded_lc.get_data(&mut frame[2..], n);
                let mut emb = Emb::decode(&frame[2..]).unwrap_or_default();
                emb.color_code = state.cfg.color_code;
                emb.lcss = lcss;
                emb.encode(&mut frame[2..]);
            }

            state.add_frame(&frame, true);

            state.net_n = n;
            state.net_frames += 1;
            state.net_lost += 1;

            n = (n + 1) % 6;
        }
    }
}

/// Replace a burst's audio payload with encoded silence.
fn insert_null_audio(burst: &mut [u8]) {
    let mut ambe = [0u8; AMBE_LENGTH_BYTES];
    for i in 0..3 {
        ambe[i * 9..(i + 1) * 9].copy_from_slice(&NULL_AMBE);
    }
    ambe_fec::insert(&ambe, burst);
}

/// Build a complete silence burst (tag + flags + silent audio).
fn silence_frame(frame: &mut [u8; FRAME_LENGTH_BYTES + 2]) {
    frame.fill(0);
    frame[0] = TAG_DATA;
    insert_null_audio(&mut frame[2..]);
}

fn check_authoritative(state: &mut SlotState, dst_id: u32) -> bool {
    if !state.cfg.authoritative && state.permitted_dst_id != dst_id {
        warn!(
            "[NON-AUTHORITATIVE] Ignoring RF traffic, destination not permitted, dstId = {dst_id}"
        );
        state.rf_state = RfState::Listening;
        return false;
    }
    true
}

fn check_traffic_collision(state: &mut SlotState, dst_id: u32, io: &mut SlotIo) -> bool {
    if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
        let message = "Traffic collision detect, preempting new RF traffic to existing network traffic";
        warn!("DMR Slot {}, {message}!", state.slot_no);
        activity_log(true, &format!("Slot {} {message}", state.slot_no));
        state.rf_state = RfState::Rejected;
        return false;
    }

    if state.enable_tscc
        && dst_id == state.net_last_dst_id
        && io.site.affiliations.is_net_granted(dst_id)
    {
        warn!(
            "DMR Slot {}, Traffic collision detect, preempting new RF traffic to existing granted network traffic!",
            state.slot_no
        );
        state.rf_state = RfState::Rejected;
        return false;
    }

    true
}

fn check_net_authoritative(state: &SlotState, dst_id: u32) -> bool {
    state.cfg.authoritative || state.permitted_dst_id == dst_id
}

fn check_net_traffic_collision(state: &SlotState, dst_id: u32) -> bool {
    if state.rf_last_dst_id != 0
        && state.rf_last_dst_id != dst_id
        && state.rf_tg_hang.is_running()
        && !state.rf_tg_hang.has_expired()
    {
        return false;
    }
    if state.net_last_dst_id != 0
        && state.net_last_dst_id != dst_id
        && state.net_tg_hang.is_running()
        && !state.net_tg_hang.has_expired()
    {
        return false;
    }
    true
}

/// Log a completed embedded-data assembly: GPS, talker alias, or noise.
fn log_embedded_data(
    slot_no: u8,
    dump_ta_data: bool,
    assembly: &EmbeddedData,
    talker_id: &mut TalkerId,
    src_id: u32,
) {
    let flco = match assembly.flco() {
        Some(flco) => flco,
        None => return,
    };
    let raw = assembly.raw_data();

    match flco {
        Flco::Group | Flco::Private => {}
        Flco::GpsInfo => {
            if dump_ta_data {
                info!(
                    "DMR Slot {slot_no}, GPS_INFO (Embedded GPS Info): {}",
                    hex::encode_upper(raw)
                );
            }
            log_gps_position(src_id, &raw);
        }
        Flco::TalkerAliasHeader => {
            if !talker_id.contains(TalkerId::HEADER) {
                if dump_ta_data {
                    info!(
                        "DMR Slot {slot_no}, TALKER_ALIAS_HEADER (Embedded Talker Alias Header): {}",
                        hex::encode_upper(raw)
                    );
                }
                talker_id.insert(TalkerId::HEADER);
            }
        }
        Flco::TalkerAliasBlock1 => {
            if !talker_id.contains(TalkerId::BLOCK1) {
                if dump_ta_data {
                    info!(
                        "DMR Slot {slot_no}, TALKER_ALIAS_BLOCK1 (Embedded Talker Alias Block 1): {}",
                        hex::encode_upper(raw)
                    );
                }
                talker_id.insert(TalkerId::BLOCK1);
            }
        }
        Flco::TalkerAliasBlock2 => {
            if !talker_id.contains(TalkerId::BLOCK2) {
                if dump_ta_data {
                    info!(
                        "DMR Slot {slot_no}, TALKER_ALIAS_BLOCK2 (Embedded Talker Alias Block 2): {}",
                        hex::encode_upper(raw)
                    );
                }
                talker_id.insert(TalkerId::BLOCK2);
            }
        }
        Flco::TalkerAliasBlock3 => {
            if !talker_id.contains(TalkerId::BLOCK3) {
                if dump_ta_data {
                    info!(
                        "DMR Slot {slot_no}, TALKER_ALIAS_BLOCK3 (Embedded Talker Alias Block 3): {}",
                        hex::encode_upper(raw)
                    );
                }
                talker_id.insert(TalkerId::BLOCK3);
            }
        }
    }
}

/// Decode and log an embedded GPS position report.
fn log_gps_position(src_id: u32, data: &[u8; 9]) {
    let error_class = (data[2] & 0x0E) >> 1;
    let error = match error_class {
        0 => "< 2m",
        1 => "< 20m",
        2 => "< 200m",
        3 => "< 2km",
        4 => "< 20km",
        5 => "< 200km",
        6 => "> 200km",
        _ => "not known",
    };

    let mut longitude_val = (i32::from(data[2] & 0x01) << 31)
        | (i32::from(data[3]) << 23)
        | (i32::from(data[4]) << 15)
        | (i32::from(data[5]) << 7);
    longitude_val >>= 7;

    let mut latitude_val =
        (i32::from(data[6]) << 24) | (i32::from(data[7]) << 16) | (i32::from(data[8]) << 8);
    latitude_val >>= 8;

    let longitude = 360.0 / 33554432.0 * longitude_val as f32; // 360/2^25 steps
    let latitude = 180.0 / 16777216.0 * latitude_val as f32; // 180/2^24 steps

    info!("GPS position for {src_id} [lat {latitude}, long {longitude}] (Position error {error})");
}
