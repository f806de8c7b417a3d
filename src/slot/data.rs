//! Data packet handling for a slot: terminator-with-LC, data headers and
//! rate-1/2, rate-3/4 and rate-1 blocks with PDU accumulation.

use log::{debug, info, warn};

use crate::defines::*;
use crate::frame::data_header::Dpf;
use crate::frame::{slot_type::SlotType, sync, DataBlock, DataHeader};
use crate::lc::{full_lc, Lc};
use crate::logging::activity_log;
use crate::lookups::AccessControl;
use crate::network::NetData;
use crate::slot::{NetState, RfState, SlcoActType, SlotIo, SlotState};

/// Data-path scratch state: the PDU reassembly buffer.
pub struct DataPacket {
    pdu_user_data: Vec<u8>,
    pdu_data_offset: usize,
}

impl DataPacket {
    pub fn new() -> Self {
        DataPacket {
            pdu_user_data: vec![0u8; MAX_PDU_COUNT * MAX_PDU_LENGTH],
            pdu_data_offset: 0,
        }
    }

    /// Process a data-path burst from the RF interface.
    pub fn process(&mut self, state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
        let data_type = DataType::from_bits(frame[1]);

        match data_type {
            DataType::TerminatorWithLc => self.process_terminator(state, frame, io),
            DataType::DataHeader => self.process_header(state, frame, io),
            DataType::Rate12Data | DataType::Rate34Data | DataType::Rate1Data => {
                self.process_block(state, frame, data_type, io)
            }
            _ => false,
        }
    }

    fn process_terminator(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8],
        io: &mut SlotIo,
    ) -> bool {
        if state.rf_state != RfState::Audio {
            return false;
        }

        let lc = match state.rf_lc {
            Some(lc) => lc,
            None => return false,
        };

        // regenerate the terminator fields
        full_lc::encode(&lc, &mut frame[2..], DataType::TerminatorWithLc);
        SlotType::new(state.cfg.color_code, DataType::TerminatorWithLc).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        if !state.rf_timeout {
            frame[0] = TAG_EOT;
            frame[1] = 0x00;

            state.write_network(frame, DataType::TerminatorWithLc, 0, io);

            if state.cfg.duplex {
                for _ in 0..state.cfg.hang_count() {
                    state.add_frame(frame, false);
                }
            }
        }

        let secs = state.rf_frames as f32 / FRAMES_PER_SECOND;
        let ber = (state.rf_errs * 100) as f32 / state.rf_bits as f32;
        if state.rssi != 0 && state.rssi_count > 0 {
            activity_log(
                true,
                &format!(
                    "Slot {} RF end of voice transmission, {:.1} seconds, BER: {:.1}%, RSSI: -{}/-{}/-{} dBm",
                    state.slot_no,
                    secs,
                    ber,
                    state.min_rssi,
                    state.max_rssi,
                    state.ave_rssi / state.rssi_count
                ),
            );
        } else {
            activity_log(
                true,
                &format!(
                    "Slot {} RF end of voice transmission, {:.1} seconds, BER: {:.1}%",
                    state.slot_no, secs, ber
                ),
            );
        }

        info!(
            "DMR Slot {}, total frames: {}, total bits: {}, errors: {}, BER: {:.4}%",
            state.slot_no, state.rf_frames, state.rf_bits, state.rf_errs, ber
        );

        // release any trunked grant held for this call
        if io.site.tscc_slot_no != 0 {
            io.site.affiliations.release_grant(lc.dst_id, false);
        }

        let timed_out = state.rf_timeout;
        state.write_end_rf(false, io);
        self.pdu_data_offset = 0;
        !timed_out
    }

    fn process_header(&mut self, state: &mut SlotState, frame: &mut [u8], io: &mut SlotIo) -> bool {
        if state.rf_state == RfState::Data {
            return true;
        }

        let header = match DataHeader::decode(&frame[2..]) {
            Some(header) => header,
            None => return false,
        };

        let gi = header.gi;
        let src_id = header.src_id;
        let dst_id = header.dst_id;

        if state.net_state != NetState::Idle && dst_id == state.net_last_dst_id {
            warn!(
                "DMR Slot {}, Traffic collision detect, preempting new RF traffic to existing network traffic!",
                state.slot_no
            );
            return false;
        }

        if !AccessControl::validate_src_id(io.rid_lookup, src_id) {
            warn!(
                "DMR Slot {}, DT_DATA_HEADER denial, RID rejection, srcId = {src_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }

        if gi && !AccessControl::validate_tg_id(io.tg_lookup, state.slot_no, dst_id) {
            warn!(
                "DMR Slot {}, DT_DATA_HEADER denial, TGID rejection, srcId = {src_id}, dstId = {dst_id}",
                state.slot_no
            );
            state.rf_state = RfState::Rejected;
            return false;
        }

        state.rf_frames = u32::from(header.blocks);
        state.rf_seq_no = 0;
        state.rf_lc = Some(Lc::new(
            if gi { Flco::Group } else { Flco::Private },
            src_id,
            dst_id,
        ));
        state.rf_data_header = Some(header);

        // regenerate the header fields
        header.encode(&mut frame[2..]);
        SlotType::new(state.cfg.color_code, DataType::DataHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = if state.rf_frames == 0 { TAG_EOT } else { TAG_DATA };
        frame[1] = 0x00;

        if state.cfg.duplex {
            state.add_frame(frame, false);
        }

        state.write_network_with(
            frame,
            DataType::DataHeader,
            if gi { Flco::Group } else { Flco::Private },
            src_id,
            dst_id,
            0,
            io,
        );

        state.rf_state = RfState::Data;
        state.rf_last_dst_id = dst_id;
        state.rf_last_src_id = src_id;

        if state.net_state == NetState::Idle {
            state.set_short_lc(
                state.slot_no,
                dst_id,
                if gi { Flco::Group } else { Flco::Private },
                SlcoActType::Data,
                io,
            );
        }

        debug!(
            "DMR Slot {}, DT_DATA_HEADER, dpf = {:?}, sap = {}, blocksToFollow = {}, padCount = {}, fsn = {}",
            state.slot_no, header.dpf, header.sap, header.blocks, header.pad_count, header.fsn
        );

        activity_log(
            true,
            &format!(
                "Slot {} RF data header from {} to {}{}, {} blocks",
                state.slot_no,
                src_id,
                if gi { "TG " } else { "" },
                dst_id,
                state.rf_frames
            ),
        );

        self.pdu_user_data.fill(0);
        self.pdu_data_offset = 0;

        if state.rf_frames == 0 {
            activity_log(
                true,
                &format!("Slot {} ended RF data transmission", state.slot_no),
            );
            state.write_end_rf(false, io);
        }

        true
    }

    fn process_block(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8],
        data_type: DataType,
        io: &mut SlotIo,
    ) -> bool {
        if state.rf_state != RfState::Data || state.rf_frames == 0 {
            return false;
        }

        match DataBlock::decode(&frame[2..], data_type) {
            Some(block) => {
                if state
                    .rf_data_header
                    .map(|h| h.dpf == Dpf::Confirmed)
                    .unwrap_or(false)
                {
                    if let Some((serial, crc_ok)) = block.confirmed_serial() {
                        if !crc_ok {
                            warn!(
                                "DMR Slot {}, confirmed data block {serial} failed CRC-9",
                                state.slot_no
                            );
                        }
                    }
                }

                let len = block.payload.len();
                if self.pdu_data_offset + len <= self.pdu_user_data.len() {
                    self.pdu_user_data[self.pdu_data_offset..self.pdu_data_offset + len]
                        .copy_from_slice(&block.payload);
                }
                self.pdu_data_offset += len;

                // regenerate the block FEC
                block.encode(&mut frame[2..]);
            }
            None => {
                warn!(
                    "DMR Slot {}, DT_RATE_34_DATA, unfixable RF rate 3/4 data",
                    state.slot_no
                );
                debug!(
                    "unfixable PDU data: {}",
                    hex::encode_upper(&frame[2..FRAME_LENGTH_BYTES + 2])
                );
                self.pdu_data_offset += DataBlock::payload_len(data_type);
            }
        }

        state.rf_frames -= 1;

        frame[0] = if state.rf_frames == 0 { TAG_EOT } else { TAG_DATA };
        frame[1] = 0x00;

        // regenerate the slot type after the block payload
        SlotType::new(state.cfg.color_code, data_type).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        let (flco, src_id, dst_id) = match state.rf_lc {
            Some(lc) => (lc.flco, lc.src_id, lc.dst_id),
            None => (Flco::Group, 0, 0),
        };
        state.write_network_with(frame, data_type, flco, src_id, dst_id, 0, io);

        if state.cfg.duplex {
            state.add_frame(frame, false);
        }

        debug!(
            "DMR Slot {}, {:?}, block = {}",
            state.slot_no,
            data_type,
            state.rf_frames + 1
        );

        if state.rf_frames == 0 {
            debug!(
                "PDU packet: {}",
                hex::encode_upper(&self.pdu_user_data[..self.pdu_data_offset.min(self.pdu_user_data.len())])
            );
            info!(
                "DMR Slot {}, DT_RATE_12/34_DATA, ended data transmission",
                state.slot_no
            );
            state.write_end_rf(false, io);
            self.pdu_data_offset = 0;
        }

        true
    }

    /// Process a data-path record from the network.
    pub fn process_network(&mut self, state: &mut SlotState, net_data: &NetData, io: &mut SlotIo) {
        let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
        frame[2..].copy_from_slice(&net_data.payload);

        match net_data.data_type {
            DataType::TerminatorWithLc => self.process_net_terminator(state, &mut frame, io),
            DataType::DataHeader => self.process_net_header(state, &mut frame, io),
            DataType::Rate12Data | DataType::Rate34Data | DataType::Rate1Data => {
                self.process_net_block(state, &mut frame, net_data.data_type, io)
            }
            _ => {
                warn!(
                    "DMR Slot {}, unhandled network data, type = {:?}",
                    state.slot_no, net_data.data_type
                );
            }
        }
    }

    fn process_net_terminator(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        io: &mut SlotIo,
    ) {
        if state.net_state != NetState::Audio {
            return;
        }

        let lc = match state.net_lc {
            Some(lc) => lc,
            None => return,
        };

        full_lc::encode(&lc, &mut frame[2..], DataType::TerminatorWithLc);
        SlotType::new(state.cfg.color_code, DataType::TerminatorWithLc).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        if !state.net_timeout {
            frame[0] = TAG_EOT;
            frame[1] = 0x00;

            let count = if state.cfg.duplex {
                state.cfg.hang_count()
            } else {
                3
            };
            for _ in 0..count {
                state.add_frame(frame, true);
            }
        }

        // the header and the terminator count toward the frame total
        state.net_frames += 2;
        activity_log(
            false,
            &format!(
                "Slot {} network end of voice transmission, {:.1} seconds, {}% packet loss, BER: {:.1}%",
                state.slot_no,
                state.net_frames as f32 / FRAMES_PER_SECOND,
                (state.net_lost * 100) / state.net_frames.max(1),
                (state.net_errs * 100) as f32 / state.net_bits as f32
            ),
        );

        state.write_end_net(false, io);
        self.pdu_data_offset = 0;
    }

    fn process_net_header(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        io: &mut SlotIo,
    ) {
        if state.net_state == NetState::Data {
            return;
        }

        let header = match DataHeader::decode(&frame[2..]) {
            Some(header) => header,
            None => {
                warn!(
                    "DMR Slot {}, DT_DATA_HEADER, unable to decode the network data header",
                    state.slot_no
                );
                return;
            }
        };

        let gi = header.gi;
        let src_id = header.src_id;
        let dst_id = header.dst_id;

        // gate mismatched destinations while the RF TG hang runs
        if state.rf_last_dst_id != 0
            && state.rf_last_dst_id != dst_id
            && state.rf_tg_hang.is_running()
            && !state.rf_tg_hang.has_expired()
        {
            return;
        }

        state.net_frames = u32::from(header.blocks);
        state.net_lc = Some(Lc::new(
            if gi { Flco::Group } else { Flco::Private },
            src_id,
            dst_id,
        ));
        state.net_data_header = Some(header);

        header.encode(&mut frame[2..]);
        SlotType::new(state.cfg.color_code, DataType::DataHeader).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = if state.net_frames == 0 { TAG_EOT } else { TAG_DATA };
        frame[1] = 0x00;

        // a small spin-up delay before the data starts
        let idle = state.idle;
        state.add_frame(&idle, true);
        state.add_frame(&idle, true);
        state.add_frame(frame, true);

        state.net_state = NetState::Data;
        state.net_last_dst_id = dst_id;
        state.net_last_src_id = src_id;

        state.set_short_lc(
            state.slot_no,
            dst_id,
            if gi { Flco::Group } else { Flco::Private },
            SlcoActType::Data,
            io,
        );

        activity_log(
            false,
            &format!(
                "Slot {} network data header from {} to {}{}, {} blocks",
                state.slot_no,
                src_id,
                if gi { "TG " } else { "" },
                dst_id,
                state.net_frames
            ),
        );

        self.pdu_user_data.fill(0);
        self.pdu_data_offset = 0;

        if state.net_frames == 0 {
            activity_log(
                false,
                &format!("Slot {} ended network data transmission", state.slot_no),
            );
            state.write_end_net(false, io);
        }
    }

    fn process_net_block(
        &mut self,
        state: &mut SlotState,
        frame: &mut [u8; FRAME_LENGTH_BYTES + 2],
        data_type: DataType,
        io: &mut SlotIo,
    ) {
        if state.net_state != NetState::Data || state.net_frames == 0 {
            state.write_end_net(false, io);
            return;
        }

        match DataBlock::decode(&frame[2..], data_type) {
            Some(block) => {
                let len = block.payload.len();
                if self.pdu_data_offset + len <= self.pdu_user_data.len() {
                    self.pdu_user_data[self.pdu_data_offset..self.pdu_data_offset + len]
                        .copy_from_slice(&block.payload);
                }
                self.pdu_data_offset += len;
                block.encode(&mut frame[2..]);
            }
            None => {
                warn!(
                    "DMR Slot {}, DT_RATE_34_DATA, unfixable network rate 3/4 data",
                    state.slot_no
                );
                self.pdu_data_offset += DataBlock::payload_len(data_type);
            }
        }

        state.net_frames -= 1;

        SlotType::new(state.cfg.color_code, data_type).encode(&mut frame[2..]);
        sync::add_data_sync(&mut frame[2..], state.cfg.duplex);

        frame[0] = if state.net_frames == 0 { TAG_EOT } else { TAG_DATA };
        frame[1] = 0x00;

        state.add_frame(frame, true);

        if state.net_frames == 0 {
            debug!(
                "PDU packet: {}",
                hex::encode_upper(&self.pdu_user_data[..self.pdu_data_offset.min(self.pdu_user_data.len())])
            );
            info!(
                "DMR Slot {}, DT_RATE_12/34_DATA, ended data transmission",
                state.slot_no
            );
            state.write_end_net(false, io);
            self.pdu_data_offset = 0;
        }
    }
}
