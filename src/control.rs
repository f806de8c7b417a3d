//! # Coordinator
//!
//! [`DmrControl`] owns both timeslot processors and the shared site state.
//! It routes modem bursts and network records by slot number, advances the
//! free-running TSCC counter, applies the cross-slot payload-activation
//! actions queued by the TSCC, and exposes the imperative operations the
//! admin surface calls.

use log::{error, info};

use crate::config::DmrConfig;
use crate::defines::*;
use crate::lc::Csbk;
use crate::lookups::{AccessControl, RadioIdLookup, TalkgroupRulesLookup};
use crate::modem::ModemPort;
use crate::network::{NetData, PeerNetwork};
use crate::remote::VoiceChannelCtrl;
use crate::site::SiteData;
use crate::slot::{NetState, RfState, SiteState, Slot, SlotAction, SlotIo};
use crate::util::Timer;

/// External collaborators handed into every coordinator entry point.
pub struct DmrIo<'a> {
    pub modem: &'a mut dyn ModemPort,
    pub network: Option<&'a mut dyn PeerNetwork>,
    pub chan_ctrl: &'a mut dyn VoiceChannelCtrl,
}

impl<'a> DmrIo<'a> {
    /// Re-borrows the collaborators for a single entry-point call, so that
    /// the same `DmrIo` can be handed to multiple slots within one clock
    /// tick without pinning the borrow to the outer call's lifetime.
    fn reborrow<'b>(&'b mut self) -> DmrIo<'b>
    where
        'a: 'b,
    {
        DmrIo {
            modem: &mut *self.modem,
            network: match &mut self.network {
                Some(n) => Some(&mut **n),
                None => None,
            },
            chan_ctrl: &mut *self.chan_ctrl,
        }
    }
}

/// The two-slot DMR site controller.
pub struct DmrControl {
    cfg: DmrConfig,
    slot1: Slot,
    slot2: Slot,
    site: SiteState,
    rid_lookup: RadioIdLookup,
    tg_lookup: TalkgroupRulesLookup,
    tscc_cnt_interval: Timer,
    enable_tscc: bool,
}

impl DmrControl {
    /// Builds the controller from a validated configuration, site identity
    /// and the read-only lookups.
    pub fn new(
        cfg: DmrConfig,
        site_data: SiteData,
        channel_no: u32,
        rid_lookup: RadioIdLookup,
        tg_lookup: TalkgroupRulesLookup,
    ) -> Self {
        let mut site = SiteState::new(site_data, channel_no);
        site.affiliations.set_grant_timeout(GRANT_TIMER_TIMEOUT_SECS);

        let mut slot1 = Slot::new(1, &cfg);
        let mut slot2 = Slot::new(2, &cfg);

        let enable_tscc = cfg.control.enable;
        if enable_tscc {
            match cfg.control.slot {
                1 => slot1.set_tscc(true, cfg.control.dedicated, &mut site),
                2 => slot2.set_tscc(true, cfg.control.dedicated, &mut site),
                slot_no => {
                    error!("DMR, invalid slot, TSCC disabled, slotNo = {slot_no}");
                }
            }
        }

        DmrControl {
            cfg,
            slot1,
            slot2,
            site,
            rid_lookup,
            tg_lookup,
            tscc_cnt_interval: Timer::from_ms(SLOT_TIME_MS / 2),
            enable_tscc,
        }
    }

    /// Adds both slots of a voice channel to the grant pool.
    pub fn add_voice_ch(&mut self, ch_no: u32) {
        self.site.affiliations.add_rf_ch(ch_no);
        if self.enable_tscc {
            let tscc_slot = self.site.tscc_slot_no;
            if tscc_slot != 0 && ch_no == self.site.channel_no {
                self.site
                    .affiliations
                    .set_slot_for_channel_tscc(ch_no, tscc_slot);
            }
        }
    }

    /// Sets the control endpoints of remote voice channels.
    pub fn set_voice_ch_data(
        &mut self,
        data: std::collections::HashMap<u32, crate::lookups::VoiceChData>,
    ) {
        self.site.affiliations.set_rf_ch_data(data);
    }

    /// Process a burst for a slot from the RF interface.
    pub fn process_frame(&mut self, slot_no: u8, frame: &mut [u8], io: &mut DmrIo) -> bool {
        let (site, rid_lookup, tg_lookup) = (&mut self.site, &self.rid_lookup, &self.tg_lookup);
        let io = io.reborrow();
        let mut slot_io = SlotIo {
            modem: io.modem,
            network: io.network,
            chan_ctrl: io.chan_ctrl,
            site,
            rid_lookup,
            tg_lookup,
        };

        let ret = match slot_no {
            1 => self.slot1.process_frame(frame, &mut slot_io),
            2 => self.slot2.process_frame(frame, &mut slot_io),
            _ => {
                error!("DMR, invalid slot, slotNo = {slot_no}");
                false
            }
        };

        self.apply_actions();
        ret
    }

    /// Get an outgoing burst for a slot from its TX queue.
    pub fn get_frame(&mut self, slot_no: u8, out: &mut [u8]) -> usize {
        match slot_no {
            1 => self.slot1.get_frame(out),
            2 => self.slot2.get_frame(out),
            _ => {
                error!("DMR, invalid slot, slotNo = {slot_no}");
                0
            }
        }
    }

    /// Process a record from the peer network, routed by its slot number.
    pub fn process_network(&mut self, net_data: &NetData, io: &mut DmrIo) {
        let (site, rid_lookup, tg_lookup) = (&mut self.site, &self.rid_lookup, &self.tg_lookup);
        let io = io.reborrow();
        let mut slot_io = SlotIo {
            modem: io.modem,
            network: io.network,
            chan_ctrl: io.chan_ctrl,
            site,
            rid_lookup,
            tg_lookup,
        };

        match net_data.slot_no {
            1 => self.slot1.process_network(net_data, &mut slot_io),
            2 => self.slot2.process_network(net_data, &mut slot_io),
            slot_no => error!("DMR, invalid slot, slotNo = {slot_no}"),
        }

        self.apply_actions();
    }

    /// Validate a wakeup burst (always slot 1): a BS-DWN-ACT CSBK whose
    /// source passes the ACL.
    pub fn process_wakeup(&self, frame: &[u8]) -> bool {
        if frame[0] != TAG_DATA || frame[1] != (IDLE_RX | SYNC_DATA | DataType::Csbk.as_bits()) {
            return false;
        }

        let csbk = match Csbk::decode(&frame[2..]) {
            Some(csbk) => csbk,
            None => return false,
        };

        let src_id = match csbk {
            Csbk::BsDwnAct { src_id, .. } => src_id,
            _ => return false,
        };

        if !AccessControl::validate_src_id(&self.rid_lookup, src_id) {
            error!("DMR, invalid CSBKO_BSDWNACT, srcId = {src_id}");
            return false;
        }

        info!("DMR, CSBKO_BSDWNACT, srcId = {src_id}");
        true
    }

    /// Advance the controller by `ms` milliseconds.
    pub fn clock(&mut self, ms: u32, io: &mut DmrIo) {
        if !self.tscc_cnt_interval.is_running() {
            self.tscc_cnt_interval.start();
        }
        self.tscc_cnt_interval.clock(ms);
        if self.tscc_cnt_interval.has_expired() {
            self.site.tscc_cnt += 1;
            if self.site.tscc_cnt == TSCC_MAX_CSC_CNT {
                self.site.tscc_cnt = 0;
            }
            self.tscc_cnt_interval.start();
        }

        {
            let (site, rid_lookup, tg_lookup) = (&mut self.site, &self.rid_lookup, &self.tg_lookup);
            let io1 = io.reborrow();
            let mut slot_io = SlotIo {
                modem: io1.modem,
                network: io1.network,
                chan_ctrl: io1.chan_ctrl,
                site,
                rid_lookup,
                tg_lookup,
            };
            self.slot1.clock(ms, &mut slot_io);
        }
        {
            let (site, rid_lookup, tg_lookup) = (&mut self.site, &self.rid_lookup, &self.tg_lookup);
            let io2 = io.reborrow();
            let mut slot_io = SlotIo {
                modem: io2.modem,
                network: io2.network,
                chan_ctrl: io2.chan_ctrl,
                site,
                rid_lookup,
                tg_lookup,
            };
            self.slot2.clock(ms, &mut slot_io);
        }

        self.apply_actions();
    }

    /// Apply the cross-slot actions queued by the TSCC.
    fn apply_actions(&mut self) {
        let actions = std::mem::take(&mut self.site.actions);
        for action in actions {
            match action {
                SlotAction::ActivatePayload {
                    slot_no,
                    dst_id,
                    src_id,
                    group,
                    voice,
                } => self.tscc_activate_slot(slot_no, dst_id, src_id, group, voice),
                SlotAction::ClearPayload { slot_no } => self.tscc_clear_activated_slot(slot_no),
            }
        }
    }

    /// Payload-activate the slot carrying granted traffic.
    pub fn tscc_activate_slot(
        &mut self,
        slot_no: u8,
        dst_id: u32,
        src_id: u32,
        group: bool,
        voice: bool,
    ) {
        info!(
            "DMR Slot {slot_no}, payload activation, srcId = {src_id}, group = {group}, dstId = {dst_id}"
        );

        // never allow the TSCC to become payload activated
        if self.site.tscc_slot_no == slot_no {
            error!("DMR, cowardly refusing to, TSCC payload activation, slotNo = {slot_no}");
            return;
        }

        match slot_no {
            1 => {
                self.site.tscc_payload_active = true;
                self.slot1.set_tscc_activated(dst_id, src_id, group, voice);
            }
            2 => {
                self.site.tscc_payload_active = true;
                self.slot2.set_tscc_activated(dst_id, src_id, group, voice);
            }
            _ => error!("DMR, invalid slot, TSCC payload activation, slotNo = {slot_no}"),
        }
    }

    /// Clear an activated payload slot.
    pub fn tscc_clear_activated_slot(&mut self, slot_no: u8) {
        info!("DMR Slot {slot_no}, payload activation clear");

        match slot_no {
            1 => self.slot1.clear_tscc_activated(),
            2 => self.slot2.clear_tscc_activated(),
            _ => {
                error!("DMR, invalid slot, TSCC payload activation, slotNo = {slot_no}");
                return;
            }
        }

        if self.site.tscc_payload_active
            && self.slot1.state.tscc_payload_dst_id == 0
            && self.slot2.state.tscc_payload_dst_id == 0
        {
            self.site.tscc_payload_active = false;
        }
    }

    /// Write an extended function block on a slot's RF interface.
    pub fn write_rf_ext_func(&mut self, slot_no: u8, function: u16, arg: u32, dst_id: u32) {
        match slot_no {
            1 => crate::slot::control::write_ext_func(&mut self.slot1.state, function, arg, dst_id),
            2 => crate::slot::control::write_ext_func(&mut self.slot2.state, function, arg, dst_id),
            _ => error!("DMR, invalid slot, slotNo = {slot_no}"),
        }
    }

    /// Write a call alert block on a slot's RF interface.
    pub fn write_rf_call_alert(&mut self, slot_no: u8, src_id: u32, dst_id: u32) {
        match slot_no {
            1 => crate::slot::control::write_call_alert(&mut self.slot1.state, src_id, dst_id),
            2 => crate::slot::control::write_call_alert(&mut self.slot2.state, src_id, dst_id),
            _ => error!("DMR, invalid slot, slotNo = {slot_no}"),
        }
    }

    /// Permit a TGID on a non-authoritative host.
    pub fn permitted_tg(&mut self, dst_id: u32, slot_no: u8) {
        match slot_no {
            1 => self.slot1.permitted_tg(dst_id),
            2 => self.slot2.permitted_tg(dst_id),
            _ => error!("DMR, invalid slot, slotNo = {slot_no}"),
        }
    }

    /// Set whether the control channel is transmitting.
    pub fn set_cc_running(&mut self, running: bool) {
        if !self.enable_tscc {
            return;
        }
        match self.site.tscc_slot_no {
            1 => self.slot1.set_cc_running(running),
            2 => self.slot2.set_cc_running(running),
            slot_no => error!("DMR, invalid slot, TSCC disabled, slotNo = {slot_no}"),
        }
    }

    /// Halt or resume control channel generation.
    pub fn set_cc_halted(&mut self, halted: bool) {
        if !self.enable_tscc {
            return;
        }
        match self.site.tscc_slot_no {
            1 => self.slot1.set_cc_halted(halted),
            2 => self.slot2.set_cc_halted(halted),
            slot_no => error!("DMR, invalid slot, TSCC disabled, slotNo = {slot_no}"),
        }
    }

    /// True when both slots carry traffic in some direction.
    pub fn is_busy(&self) -> bool {
        (self.slot1.state.rf_state != RfState::Listening
            || self.slot1.state.net_state != NetState::Idle)
            && (self.slot2.state.rf_state != RfState::Listening
                || self.slot2.state.net_state != NetState::Idle)
    }

    /// The shared site state (affiliations, TSCC counter).
    pub fn site(&self) -> &SiteState {
        &self.site
    }

    pub fn site_mut(&mut self) -> &mut SiteState {
        &mut self.site
    }

    /// Borrow a slot's processor state (primarily for inspection).
    pub fn slot(&self, slot_no: u8) -> Option<&Slot> {
        match slot_no {
            1 => Some(&self.slot1),
            2 => Some(&self.slot2),
            _ => None,
        }
    }

    pub fn slot_mut(&mut self, slot_no: u8) -> Option<&mut Slot> {
        match slot_no {
            1 => Some(&mut self.slot1),
            2 => Some(&mut self.slot2),
            _ => None,
        }
    }

    pub fn config(&self) -> &DmrConfig {
        &self.cfg
    }
}
