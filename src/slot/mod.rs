//! # Per-Slot Processor
//!
//! One [`Slot`] owns everything a DMR timeslot needs: the RF and network
//! state machines, the current call context, the TX frame ring, timers,
//! statistics and the TSCC fields. Incoming bursts dispatch by sync kind and
//! data type to the voice, data and control-signalling sub-handlers; the
//! coordinator drives `clock()` once per millisecond tick.
//!
//! Cross-slot effects (payload activation ordered by the TSCC for the other
//! slot) are queued as [`SlotAction`]s on the shared [`SiteState`] and
//! applied by the coordinator after the call returns.

pub mod control;
pub mod data;
pub mod voice;

use bitflags::bitflags;
use log::{debug, error, info, warn};

use crate::config::DmrConfig;
use crate::defines::*;
use crate::frame::{slot_type::SlotType, sync};
use crate::lc::{Lc, PrivacyLc};
use crate::logging::activity_log;
use crate::lookups::{AffiliationStore, RadioIdLookup, TalkgroupRulesLookup};
use crate::modem::ModemPort;
use crate::network::{NetData, PeerNetwork};
use crate::remote::VoiceChannelCtrl;
use crate::site::SiteData;
use crate::util::{FrameRing, Timer};

use data::DataPacket;
use voice::Voice;

/// RF-side slot states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfState {
    Listening,
    LateEntry,
    Audio,
    Data,
    Rejected,
}

/// Network-side slot states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetState {
    Idle,
    Audio,
    Data,
}

/// Short-LC activity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlcoActType {
    Voice,
    Data,
}

bitflags! {
    /// Which talker-alias fragments have been seen this call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TalkerId: u8 {
        const HEADER = 0x01;
        const BLOCK1 = 0x02;
        const BLOCK2 = 0x04;
        const BLOCK3 = 0x08;
    }
}

/// Cross-slot effect requested by a slot, applied by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    ActivatePayload {
        slot_no: u8,
        dst_id: u32,
        src_id: u32,
        group: bool,
        voice: bool,
    },
    ClearPayload {
        slot_no: u8,
    },
}

/// Site-wide mutable state shared by both slots, owned by the coordinator.
pub struct SiteState {
    pub data: SiteData,
    pub affiliations: AffiliationStore,
    /// Free-running 9-bit TSCC counter, advanced every half slot time.
    pub tscc_cnt: u16,
    pub tscc_payload_active: bool,
    /// Slot number carrying the TSCC; 0 when trunking is off.
    pub tscc_slot_no: u8,
    /// This host's own RF channel number.
    pub channel_no: u32,
    /// Effects queued for the coordinator.
    pub actions: Vec<SlotAction>,
    // short-LC activity fields span both slots
    slc_id: [u8; 2],
    slc_flco: [Flco; 2],
    slc_voice: [bool; 2],
}

impl SiteState {
    pub fn new(data: SiteData, channel_no: u32) -> Self {
        SiteState {
            data,
            affiliations: AffiliationStore::new(),
            tscc_cnt: 0,
            tscc_payload_active: false,
            tscc_slot_no: 0,
            channel_no,
            actions: Vec::new(),
            slc_id: [0; 2],
            slc_flco: [Flco::Group; 2],
            slc_voice: [true; 2],
        }
    }
}

/// External collaborators handed into every slot entry point.
pub struct SlotIo<'a, 'b> {
    pub modem: &'a mut dyn ModemPort,
    pub network: Option<&'a mut dyn PeerNetwork>,
    pub chan_ctrl: &'a mut dyn VoiceChannelCtrl,
    pub site: &'b mut SiteState,
    pub rid_lookup: &'b RadioIdLookup,
    pub tg_lookup: &'b TalkgroupRulesLookup,
}

/// The state block every sub-handler mutates.
pub struct SlotState {
    pub slot_no: u8,
    pub cfg: DmrConfig,

    pub rf_state: RfState,
    pub net_state: NetState,

    pub rf_last_dst_id: u32,
    pub rf_last_src_id: u32,
    pub net_last_dst_id: u32,
    pub net_last_src_id: u32,
    pub permitted_dst_id: u32,

    pub rf_lc: Option<Lc>,
    pub rf_privacy_lc: Option<PrivacyLc>,
    pub rf_data_header: Option<crate::frame::DataHeader>,
    pub net_lc: Option<Lc>,
    pub net_privacy_lc: Option<PrivacyLc>,
    pub net_data_header: Option<crate::frame::DataHeader>,

    pub rf_seq_no: u8,
    pub rf_n: u8,
    pub last_rf_n: u8,
    pub net_n: u8,
    pub rf_talker_id: TalkerId,
    pub net_talker_id: TalkerId,

    pub queue: FrameRing,

    pub rf_timeout_timer: Timer,
    pub net_timeout_timer: Timer,
    pub rf_tg_hang: Timer,
    pub net_tg_hang: Timer,
    pub network_watchdog: Timer,
    pub packet_timer: Timer,
    pub cc_packet_interval: Timer,
    pub tscc_payload_act_retry: Timer,
    /// Milliseconds since the last network voice frame (jitter gauge).
    pub net_elapsed_ms: u32,

    pub rf_frames: u32,
    pub net_frames: u32,
    pub net_lost: u32,
    pub rf_bits: u32,
    pub net_bits: u32,
    pub rf_errs: u32,
    pub net_errs: u32,
    pub rf_timeout: bool,
    pub net_timeout: bool,

    pub rssi: u16,
    pub min_rssi: u16,
    pub max_rssi: u16,
    pub ave_rssi: u32,
    pub rssi_count: u32,

    pub enable_tscc: bool,
    pub dedicated_tscc: bool,
    pub cc_seq: u8,
    pub cc_running: bool,
    pub cc_prev_running: bool,
    pub cc_halted: bool,
    pub supervisor: bool,

    pub tscc_payload_dst_id: u32,
    pub tscc_payload_src_id: u32,
    pub tscc_payload_group: bool,
    pub tscc_payload_voice: bool,
    pub last_late_entry: usize,

    /// Pre-built idle burst (tag + flags + payload).
    pub idle: [u8; FRAME_LENGTH_BYTES + 2],
}

/// A DMR timeslot processor.
pub struct Slot {
    pub state: SlotState,
    voice: Voice,
    data: DataPacket,
}

impl Slot {
    /// Creates a slot processor from the validated configuration.
    pub fn new(slot_no: u8, cfg: &DmrConfig) -> Self {
        let mut idle = [0u8; FRAME_LENGTH_BYTES + 2];
        idle[0] = TAG_DATA;
        // pseudo-random idle fill keeps the transmitted spectrum busy
        for (i, b) in idle[2..].iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(0x4D).wrapping_add(0x33);
        }
        sync::add_data_sync(&mut idle[2..], cfg.duplex);
        SlotType::new(cfg.color_code, DataType::Idle).encode(&mut idle[2..]);

        let state = SlotState {
            slot_no,
            cfg: cfg.clone(),
            rf_state: RfState::Listening,
            net_state: NetState::Idle,
            rf_last_dst_id: 0,
            rf_last_src_id: 0,
            net_last_dst_id: 0,
            net_last_src_id: 0,
            permitted_dst_id: 0,
            rf_lc: None,
            rf_privacy_lc: None,
            rf_data_header: None,
            net_lc: None,
            net_privacy_lc: None,
            net_data_header: None,
            rf_seq_no: 0,
            rf_n: 0,
            last_rf_n: 0,
            net_n: 0,
            rf_talker_id: TalkerId::empty(),
            net_talker_id: TalkerId::empty(),
            queue: FrameRing::new(cfg.queue_size, cfg.queue_size_max, "DMR Slot Frame"),
            rf_timeout_timer: Timer::from_secs(cfg.timeout),
            net_timeout_timer: Timer::from_secs(cfg.timeout),
            rf_tg_hang: Timer::from_secs(cfg.call_hang),
            net_tg_hang: Timer::from_secs(cfg.call_hang),
            network_watchdog: Timer::from_ms(NET_WATCHDOG_MS),
            packet_timer: Timer::from_ms(50),
            cc_packet_interval: Timer::from_ms(SLOT_TIME_MS),
            tscc_payload_act_retry: Timer::from_ms(SLOT_TIME_MS * 10),
            net_elapsed_ms: 0,
            rf_frames: 0,
            net_frames: 0,
            net_lost: 0,
            rf_bits: 1,
            net_bits: 1,
            rf_errs: 0,
            net_errs: 0,
            rf_timeout: false,
            net_timeout: false,
            rssi: 0,
            min_rssi: 0,
            max_rssi: 0,
            ave_rssi: 0,
            rssi_count: 0,
            enable_tscc: false,
            dedicated_tscc: false,
            cc_seq: 0,
            cc_running: false,
            cc_prev_running: false,
            cc_halted: false,
            supervisor: cfg.supervisor,
            tscc_payload_dst_id: 0,
            tscc_payload_src_id: 0,
            tscc_payload_group: false,
            tscc_payload_voice: true,
            last_late_entry: 0,
            idle,
        };

        Slot {
            state,
            voice: Voice::new(),
            data: DataPacket::new(),
        }
    }

    /// Process one burst from the modem. Returns true when consumed.
    pub fn process_frame(&mut self, frame: &mut [u8], io: &mut SlotIo) -> bool {
        let state = &mut self.state;

        if frame[0] == TAG_LOST && state.rf_state == RfState::Audio {
            let secs = state.rf_frames as f32 / FRAMES_PER_SECOND;
            let ber = (state.rf_errs * 100) as f32 / state.rf_bits as f32;
            if state.rssi != 0 && state.rssi_count > 0 {
                activity_log(
                    true,
                    &format!(
                        "Slot {} RF voice transmission lost, {:.1} seconds, BER: {:.1}%, RSSI: -{}/-{}/-{} dBm",
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
                        "Slot {} RF voice transmission lost, {:.1} seconds, BER: {:.1}%",
                        state.slot_no, secs, ber
                    ),
                );
            }

            info!(
                "DMR Slot {}, total frames: {}, total bits: {}, errors: {}, BER: {:.4}%",
                state.slot_no,
                state.rf_frames,
                state.rf_bits,
                state.rf_errs,
                (state.rf_errs * 100) as f32 / state.rf_bits as f32
            );

            // release any trunked grant held for this call
            if io.site.tscc_slot_no != 0 {
                if let Some(lc) = state.rf_lc {
                    io.site.affiliations.release_grant(lc.dst_id, false);
                }
            }

            if state.rf_timeout {
                state.write_end_rf(false, io);
                return false;
            }
            state.write_end_rf(true, io);
            return true;
        }

        if frame[0] == TAG_LOST && state.rf_state == RfState::Data {
            activity_log(
                true,
                &format!("Slot {}, RF data transmission lost", state.slot_no),
            );
            state.write_end_rf(false, io);
            return false;
        }

        if frame[0] == TAG_LOST {
            state.rf_state = RfState::Listening;
            state.rf_last_dst_id = 0;
            state.rf_last_src_id = 0;
            state.rf_tg_hang.stop();
            return false;
        }

        // optional raw RSSI trailer
        if frame.len() == FRAME_LENGTH_BYTES + 4 {
            let raw = (u16::from(frame[FRAME_LENGTH_BYTES + 2]) << 8)
                | u16::from(frame[FRAME_LENGTH_BYTES + 3]);
            state.rssi = raw;
            if state.rssi_count == 0 || raw < state.min_rssi {
                state.min_rssi = raw;
            }
            if raw > state.max_rssi {
                state.max_rssi = raw;
            }
            state.ave_rssi += u32::from(raw);
            state.rssi_count += 1;
        }

        let data_sync = (frame[1] & SYNC_DATA) == SYNC_DATA;
        let voice_sync = (frame[1] & SYNC_VOICE) == SYNC_VOICE;

        if !(data_sync || voice_sync) && state.rf_state == RfState::Listening {
            let data_errs = sync::distance(&frame[2..], &MS_SOURCED_DATA_SYNC);
            let voice_errs = sync::distance(&frame[2..], &MS_SOURCED_VOICE_SYNC);
            warn!(
                "DMR, possible sync word rejected, dataErrs = {data_errs}, voiceErrs = {voice_errs}"
            );
            return false;
        }

        if (data_sync || voice_sync) && state.rf_state != RfState::Listening {
            state.rf_tg_hang.start();
        }

        if data_sync {
            let data_type = DataType::from_bits(frame[1]);

            if data_type == DataType::Csbk {
                return control::process(state, frame, io);
            }

            if state.enable_tscc && state.dedicated_tscc {
                return false;
            }

            return match data_type {
                DataType::VoiceLcHeader | DataType::VoicePiHeader => {
                    self.voice.process(state, frame, io)
                }
                _ => self.data.process(state, frame, io),
            };
        }

        self.voice.process(state, frame, io)
    }

    /// Dequeue one outgoing burst; returns its length, 0 when empty.
    pub fn get_frame(&mut self, out: &mut [u8]) -> usize {
        self.state.queue.get_frame(out)
    }

    /// Process one record from the peer network.
    pub fn process_network(&mut self, net_data: &NetData, io: &mut SlotIo) {
        let state = &mut self.state;

        // don't process network frames while the RF modem isn't listening
        if state.rf_state != RfState::Listening {
            warn!(
                "Traffic collision detect, preempting new network traffic to existing RF traffic!"
            );
            return;
        }

        // gate mismatched destinations while the RF TG hang runs
        if state.rf_last_dst_id != 0 {
            let hang_live = state.rf_tg_hang.is_running() && !state.rf_tg_hang.has_expired();
            if state.rf_last_dst_id != net_data.dst_id && hang_live {
                return;
            }
            if state.rf_last_dst_id == net_data.dst_id && hang_live {
                state.rf_tg_hang.start();
            }
        }

        state.network_watchdog.start();

        // a dedicated TSCC slot accepts only CSBK traffic
        if state.enable_tscc
            && state.dedicated_tscc
            && state.slot_no == io.site.tscc_slot_no
            && net_data.data_type != DataType::Csbk
        {
            return;
        }

        match net_data.data_type {
            DataType::Csbk => control::process_network(state, net_data, io),
            DataType::VoiceLcHeader
            | DataType::VoicePiHeader
            | DataType::VoiceSync
            | DataType::Voice => self.voice.process_network(state, net_data, io),
            _ => self.data.process_network(state, net_data, io),
        }
    }

    /// Advance timers and the TSCC beacon by `ms` milliseconds.
    pub fn clock(&mut self, ms: u32, io: &mut SlotIo) {
        let state = &mut self.state;

        if let Some(network) = io.network.as_deref() {
            io.site.data.set_net_active(network.is_running());
        }

        // control channel clocking generates the CC data stream
        if state.enable_tscc {
            io.modem.ignore_cach_at(state.slot_no);
            io.site.affiliations.clock(ms);

            // expired/released grants clear their payload activations
            for (ch_no, _dst_id, slot_no) in io.site.affiliations.take_released() {
                if ch_no == io.site.channel_no {
                    io.site.actions.push(SlotAction::ClearPayload { slot_no });
                    continue;
                }

                if let Some(ch_data) = io.site.affiliations.rf_ch_data(ch_no).cloned() {
                    if ch_data.is_valid() {
                        let clear = crate::remote::PayloadClearRequest {
                            slot: slot_no,
                            clear: true,
                        };
                        if io.chan_ctrl.payload_clear(&ch_data, &clear).is_err() {
                            error!(
                                "DMR Slot {}, failed to clear payload channel, chNo = {ch_no}, slot = {slot_no}",
                                state.slot_no
                            );
                        }

                        if state.cfg.authoritative && state.supervisor {
                            let permit = crate::remote::PermitTgRequest {
                                state: 1,
                                dst_id: 0,
                                slot: slot_no,
                            };
                            if io.chan_ctrl.permit_tg(&ch_data, &permit).is_err() {
                                error!(
                                    "DMR Slot {}, failed to clear TG permit, chNo = {ch_no}, slot = {slot_no}",
                                    state.slot_no
                                );
                            }
                        }
                    } else {
                        error!(
                            "DMR Slot {}, failed to clear payload channel, chNo = {ch_no}, slot = {slot_no}",
                            state.slot_no
                        );
                    }
                }
            }

            if state.cc_running && !state.cc_packet_interval.is_running() {
                state.cc_packet_interval.start();
            }

            if state.cc_halted {
                if !state.cc_running {
                    state.cc_halted = false;
                    state.cc_prev_running = state.cc_running;
                    state.queue.clear();
                }
            } else {
                state.cc_packet_interval.clock(ms);
                if !state.cc_packet_interval.is_running() {
                    state.cc_packet_interval.start();
                }

                if state.cc_packet_interval.has_expired() {
                    if state.cc_running {
                        if state.cc_seq == 4 {
                            state.cc_seq = 0;
                        }

                        if io.site.tscc_payload_active {
                            if io.site.tscc_cnt % 2 == 0 {
                                state.set_short_lc_payload(io);
                            }
                        } else {
                            state.set_short_lc_tscc(io);
                        }

                        let frame_cnt = io.site.tscc_cnt;
                        let seq = state.cc_seq;
                        control::write_control_data(state, frame_cnt, seq, io);

                        state.cc_seq += 1;
                    }

                    state.cc_packet_interval.start();
                }
            }

            if state.cc_prev_running && !state.cc_running {
                state.queue.clear();
                state.cc_prev_running = state.cc_running;
            }
        }

        // payload slot advertises its pending activation between calls
        if io.site.tscc_payload_active && !state.enable_tscc {
            if state.rf_state == RfState::Listening && state.net_state == NetState::Idle {
                if state.tscc_payload_dst_id > 0 && io.site.tscc_cnt % 2 > 0 {
                    let dst_id = state.tscc_payload_dst_id;
                    let flco = if state.tscc_payload_group {
                        Flco::Group
                    } else {
                        Flco::Private
                    };
                    let act = if state.tscc_payload_voice {
                        SlcoActType::Voice
                    } else {
                        SlcoActType::Data
                    };
                    state.set_short_lc(state.slot_no, dst_id, flco, act, io);
                }
            } else {
                state.clear_tscc_activated();
            }
        }

        state.rf_timeout_timer.clock(ms);
        if state.rf_timeout_timer.has_expired() && !state.rf_timeout {
            info!("DMR Slot {}, user has timed out", state.slot_no);
            state.rf_timeout = true;
        }

        state.net_timeout_timer.clock(ms);
        if state.net_timeout_timer.has_expired() && !state.net_timeout {
            info!("DMR Slot {}, user has timed out", state.slot_no);
            state.net_timeout = true;
        }

        if state.rf_tg_hang.is_running() {
            state.rf_tg_hang.clock(ms);
            if state.rf_tg_hang.has_expired() {
                state.rf_tg_hang.stop();
                debug!(
                    "Slot {}, talkgroup hang has expired, lastDstId = {}",
                    state.slot_no, state.rf_last_dst_id
                );
                state.rf_last_dst_id = 0;
                state.rf_last_src_id = 0;

                if !state.cfg.authoritative && state.permitted_dst_id != 0 {
                    state.permitted_dst_id = 0;
                }
            }
        }

        if state.net_tg_hang.is_running() {
            state.net_tg_hang.clock(ms);
            if state.net_tg_hang.has_expired() {
                state.net_tg_hang.stop();
                state.net_last_dst_id = 0;
                state.net_last_src_id = 0;
            }
        }

        if state.net_state == NetState::Audio || state.net_state == NetState::Data {
            state.network_watchdog.clock(ms);

            if state.network_watchdog.has_expired() {
                if state.net_state == NetState::Audio {
                    // the voice header counts toward the frame total
                    state.net_frames += 1;
                    activity_log(
                        false,
                        &format!(
                            "Slot {} network watchdog has expired, {:.1} seconds, {}% packet loss, BER: {:.1}%",
                            state.slot_no,
                            state.net_frames as f32 / FRAMES_PER_SECOND,
                            (state.net_lost * 100) / state.net_frames.max(1),
                            (state.net_errs * 100) as f32 / state.net_bits as f32
                        ),
                    );
                    state.write_end_net(true, io);
                } else {
                    activity_log(
                        false,
                        &format!("Slot {} network watchdog has expired", state.slot_no),
                    );
                    state.write_end_net(false, io);
                }
            }
        }

        if state.net_state == NetState::Audio {
            state.net_elapsed_ms = state.net_elapsed_ms.saturating_add(ms);
            state.packet_timer.clock(ms);

            if state.packet_timer.has_expired() {
                let elapsed = state.net_elapsed_ms;
                if elapsed >= state.cfg.jitter {
                    warn!(
                        "DMR Slot {}, lost audio for {}ms filling in",
                        state.slot_no, elapsed
                    );
                    let slots = state.cfg.jitter_slots();
                    self.voice.insert_silence(state, slots);
                    state.net_elapsed_ms = 0;
                }
                state.packet_timer.start();
            }
        }

        // a payload slot re-advertises its pending grant until traffic lands
        if state.tscc_payload_act_retry.is_running() {
            state.tscc_payload_act_retry.clock(ms);
            if state.tscc_payload_act_retry.has_expired() {
                control::write_payload_grant(state, io);
                state.tscc_payload_act_retry.start();
            }
        }

        if state.rf_state == RfState::Rejected {
            if !state.enable_tscc {
                state.queue.clear();
            }

            state.rf_frames = 0;
            state.rf_errs = 0;
            state.rf_bits = 1;
            state.net_frames = 0;
            state.net_lost = 0;

            if let Some(network) = io.network.as_deref_mut() {
                network.reset_slot(state.slot_no);
            }

            state.rf_state = RfState::Listening;
        }
    }

    /// Permit a TGID on a non-authoritative host.
    pub fn permitted_tg(&mut self, dst_id: u32) {
        if self.state.cfg.authoritative {
            return;
        }
        self.state.permitted_dst_id = dst_id;
    }

    /// Enable and configure TSCC support for this slot.
    pub fn set_tscc(&mut self, enable: bool, dedicated: bool, site: &mut SiteState) {
        self.state.enable_tscc = enable;
        self.state.dedicated_tscc = dedicated;
        if enable {
            site.tscc_slot_no = self.state.slot_no;
            site.affiliations
                .set_slot_for_channel_tscc(site.channel_no, self.state.slot_no);
            site.affiliations.set_grant_timeout(GRANT_TIMER_TIMEOUT_SECS);
        }
    }

    pub fn set_cc_running(&mut self, running: bool) {
        self.state.cc_prev_running = self.state.cc_running;
        self.state.cc_running = running;
    }

    pub fn set_cc_halted(&mut self, halted: bool) {
        self.state.cc_halted = halted;
    }

    /// Activate this slot as a TSCC payload channel.
    pub fn set_tscc_activated(&mut self, dst_id: u32, src_id: u32, group: bool, voice: bool) {
        self.state.tscc_payload_dst_id = dst_id;
        self.state.tscc_payload_src_id = src_id;
        self.state.tscc_payload_group = group;
        self.state.tscc_payload_voice = voice;
        self.state.tscc_payload_act_retry.start();
    }

    pub fn clear_tscc_activated(&mut self) {
        self.state.clear_tscc_activated();
    }
}

impl SlotState {
    /// Queue one outgoing burst. RF-originated adds grow the ring on
    /// overflow; net-originated adds drop.
    pub fn add_frame(&mut self, frame: &[u8], net: bool) {
        if !net && self.net_state != NetState::Idle {
            return;
        }

        let grow = !net;
        if !self
            .queue
            .add_frame(&frame[..FRAME_LENGTH_BYTES + 2], grow)
        {
            error!(
                "Slot {}, overflow in the DMR slot queue{}",
                self.slot_no,
                if net { " while writing network data" } else { "" }
            );
        }
    }

    /// Fan an RF-originated burst out to the peer network using the current
    /// call's LC for addressing.
    pub fn write_network(
        &mut self,
        frame: &[u8],
        data_type: DataType,
        errors: u8,
        io: &mut SlotIo,
    ) {
        let lc = match self.rf_lc {
            Some(lc) => lc,
            None => return,
        };
        self.write_network_with(frame, data_type, lc.flco, lc.src_id, lc.dst_id, errors, io);
    }

    /// Fan an RF-originated burst out to the peer network with explicit
    /// addressing.
    #[allow(clippy::too_many_arguments)]
    pub fn write_network_with(
        &mut self,
        frame: &[u8],
        data_type: DataType,
        flco: Flco,
        src_id: u32,
        dst_id: u32,
        errors: u8,
        io: &mut SlotIo,
    ) {
        if self.net_state != NetState::Idle {
            return;
        }

        let network = match io.network.as_deref_mut() {
            Some(network) => network,
            None => return,
        };

        let mut net_data = NetData::new(self.slot_no, data_type);
        net_data.src_id = src_id;
        net_data.dst_id = dst_id;
        net_data.flco = flco;
        net_data.n = self.rf_n;
        net_data.seq_no = self.rf_seq_no;
        net_data.ber = errors;
        net_data.rssi = (self.rssi >> 8) as u8;
        net_data.payload.copy_from_slice(&frame[2..FRAME_LENGTH_BYTES + 2]);

        self.rf_seq_no = self.rf_seq_no.wrapping_add(1);

        network.write_frame(&net_data);
    }

    /// Close down the RF side of the slot; `write_end` emits the terminator
    /// hang bursts.
    pub fn write_end_rf(&mut self, write_end: bool, io: &mut SlotIo) {
        self.rf_state = RfState::Listening;

        if self.net_state == NetState::Idle {
            if self.enable_tscc {
                self.set_short_lc_payload(io);
            } else {
                self.set_short_lc(self.slot_no, 0, Flco::Group, SlcoActType::Voice, io);
            }
        }

        if write_end && self.net_state == NetState::Idle && self.cfg.duplex && !self.rf_timeout {
            if let Some(lc) = self.rf_lc {
                let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
                sync::add_data_sync(&mut frame[2..], self.cfg.duplex);
                crate::lc::full_lc::encode(&lc, &mut frame[2..], DataType::TerminatorWithLc);
                SlotType::new(self.cfg.color_code, DataType::TerminatorWithLc)
                    .encode(&mut frame[2..]);
                frame[0] = TAG_EOT;
                frame[1] = 0x00;

                for _ in 0..self.cfg.hang_count() {
                    self.add_frame(&frame, false);
                }
            }
        }

        if let Some(network) = io.network.as_deref_mut() {
            network.reset_slot(self.slot_no);
        }

        self.rf_timeout_timer.stop();
        self.rf_timeout = false;

        self.rf_frames = 0;
        self.rf_errs = 0;
        self.rf_bits = 1;

        self.rf_lc = None;
        self.rf_privacy_lc = None;
        self.rf_data_header = None;
    }

    /// Close down the network side of the slot.
    pub fn write_end_net(&mut self, write_end: bool, io: &mut SlotIo) {
        self.net_state = NetState::Idle;

        self.set_short_lc(self.slot_no, 0, Flco::Group, SlcoActType::Voice, io);

        if write_end && !self.net_timeout {
            if let Some(lc) = self.net_lc {
                let mut frame = [0u8; FRAME_LENGTH_BYTES + 2];
                sync::add_data_sync(&mut frame[2..], self.cfg.duplex);
                crate::lc::full_lc::encode(&lc, &mut frame[2..], DataType::TerminatorWithLc);
                SlotType::new(self.cfg.color_code, DataType::TerminatorWithLc)
                    .encode(&mut frame[2..]);
                frame[0] = TAG_EOT;
                frame[1] = 0x00;

                let count = if self.cfg.duplex {
                    self.cfg.hang_count()
                } else {
                    3
                };
                for _ in 0..count {
                    self.add_frame(&frame, true);
                }
            }
        }

        if let Some(network) = io.network.as_deref_mut() {
            network.reset_slot(self.slot_no);
        }

        self.network_watchdog.stop();
        self.net_timeout_timer.stop();
        self.packet_timer.stop();
        self.net_timeout = false;

        self.net_frames = 0;
        self.net_lost = 0;
        self.net_errs = 0;
        self.net_bits = 1;

        self.net_lc = None;
        self.net_privacy_lc = None;
        self.net_data_header = None;
    }

    /// Update the activity short LC for a slot and push it to the modem.
    pub fn set_short_lc(
        &self,
        slot_no: u8,
        id: u32,
        flco: Flco,
        act: SlcoActType,
        io: &mut SlotIo,
    ) {
        let idx = match slot_no {
            1 => 0usize,
            2 => 1usize,
            _ => {
                error!("invalid slot number passed to set_short_lc, slotNo = {slot_no}");
                return;
            }
        };

        io.site.slc_id[idx] = 0;
        io.site.slc_flco[idx] = flco;
        io.site.slc_voice[idx] = act == SlcoActType::Voice;
        if id != 0 {
            let hash_src = [(id >> 16) as u8, (id >> 8) as u8, id as u8];
            io.site.slc_id[idx] = crate::edac::crc::crc8(&hash_src);
        }

        // nothing to report; the modem idles the short LC on its own
        if io.site.slc_id[0] == 0 && io.site.slc_id[1] == 0 {
            return;
        }

        let mut lc = [0u8; 4];
        lc[0] = SLCO_ACT;
        for (i, &slc_id) in io.site.slc_id.iter().enumerate() {
            if slc_id == 0 {
                continue;
            }
            lc[2 + i] = slc_id;
            let nibble = match (io.site.slc_voice[i], io.site.slc_flco[i] == Flco::Group) {
                (true, true) => 0x08,
                (true, false) => 0x09,
                (false, false) => 0x0A,
                (false, true) => 0x0B,
            };
            lc[1] |= nibble << (4 * (1 - i as u8));
        }

        io.modem.write_short_lc(&crate::frame::short_lc::encode(&lc));
    }

    /// Push the TSCC control-channel short LC (site identity + counter).
    pub fn set_short_lc_tscc(&self, io: &mut SlotIo) {
        let lc = Self::control_short_lc(SLCO_TSCC, io, io.site.data.require_reg());
        io.modem.write_short_lc(&crate::frame::short_lc::encode(&lc));
    }

    /// Push the payload-channel short LC (site identity + counter).
    pub fn set_short_lc_payload(&self, io: &mut SlotIo) {
        // payload channel advertises as normal (no registration demand)
        let lc = Self::control_short_lc(SLCO_PAYLOAD, io, false);
        io.modem.write_short_lc(&crate::frame::short_lc::encode(&lc));
    }

    fn control_short_lc(slco: u8, io: &SlotIo, flag: bool) -> [u8; 4] {
        let mut value: u32 = u32::from(slco);
        value = (value << 14) | io.site.data.system_identity();
        value = (value << 1) | u32::from(flag);
        value = (value << 9) | u32::from(io.site.tscc_cnt & 0x1FF);

        [
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ]
    }

    pub(crate) fn clear_tscc_activated(&mut self) {
        self.tscc_payload_dst_id = 0;
        self.tscc_payload_src_id = 0;
        self.tscc_payload_group = false;
        self.tscc_payload_voice = true;
        self.tscc_payload_act_retry.stop();
    }
}
