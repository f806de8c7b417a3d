//! # Configuration
//!
//! The `system.protocols.dmr` configuration block, deserialized with serde
//! and validated into the clamped form the slot processors consume. Invalid
//! values degrade per the failure rules: out-of-range silence thresholds fall
//! back to defaults with a warning, an invalid TSCC slot disables the TSCC
//! with an error log.

use log::{error, warn};
use serde::Deserialize;

use crate::defines::{DEFAULT_NRAND_WAIT, DEFAULT_SILENCE_THRESHOLD, MAX_VOICE_ERRORS};
use crate::error::DmrError;

/// TSCC control-channel options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlConfig {
    /// Enables the trunking site control channel.
    pub enable: bool,
    /// Dedicates the control slot (no voice/data fallback on that slot).
    pub dedicated: bool,
    /// Slot number carrying the TSCC (1 or 2).
    pub slot: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        ControlConfig {
            enable: false,
            dedicated: false,
            slot: 1,
        }
    }
}

/// The recognized `system.protocols.dmr` options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DmrConfig {
    /// DMR access color code (0-15), enforced on EMB decode.
    pub color_code: u8,
    /// Drop non-LC embedded content; never emit talker alias / GPS.
    pub embedded_lc_only: bool,
    /// Log decoded talker alias and GPS blocks.
    pub dump_ta_data: bool,
    /// Bit-error threshold above which a voice burst is silence-filled.
    pub silence_threshold: u32,
    /// Gate grants on successful prior unit registration.
    pub verify_reg: bool,
    /// TSCC Aloha random-access wait (0-15).
    pub n_rand_wait: u8,
    /// TSCC Aloha backoff (0-15).
    pub back_off: u8,
    /// TSCC mode selection.
    pub control: ControlConfig,
    /// Net-audio jitter-buffer fill threshold in milliseconds.
    pub jitter: u32,
    /// Call hang time in seconds; terminator count is `callHang * 17`.
    pub call_hang: u32,
    /// RF/net session maximum in seconds.
    pub timeout: u32,
    /// Initial TX ring capacity in bytes.
    pub queue_size: usize,
    /// TX ring growth cap in bytes; 0 selects 4x the initial size.
    pub queue_size_max: usize,
    /// Whether this host is grant-authoritative for the site.
    pub authoritative: bool,
    /// Full-duplex operation.
    pub duplex: bool,
    /// Host carries supervisory functions (may permit TGs on voice channels).
    pub supervisor: bool,
    /// Skip the grant source collision check (the collision is still logged).
    pub disable_grant_src_id_check: bool,
}

impl Default for DmrConfig {
    fn default() -> Self {
        DmrConfig {
            color_code: 1,
            embedded_lc_only: false,
            dump_ta_data: true,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            verify_reg: false,
            n_rand_wait: DEFAULT_NRAND_WAIT,
            back_off: 1,
            control: ControlConfig::default(),
            jitter: 360,
            call_hang: 3,
            timeout: 180,
            queue_size: 3960,
            queue_size_max: 0,
            authoritative: true,
            duplex: true,
            supervisor: false,
            disable_grant_src_id_check: false,
        }
    }
}

impl DmrConfig {
    /// Parses a configuration block from JSON.
    pub fn from_json(json: &str) -> Result<DmrConfig, DmrError> {
        let mut cfg: DmrConfig =
            serde_json::from_str(json).map_err(|e| DmrError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Clamps and sanity-checks option values in place.
    pub fn validate(&mut self) -> Result<(), DmrError> {
        if self.color_code > 15 {
            return Err(DmrError::Config(format!(
                "colorCode must be 0-15, got {}",
                self.color_code
            )));
        }

        if self.n_rand_wait > 15 {
            self.n_rand_wait = 15;
        }
        if self.back_off > 15 {
            self.back_off = 15;
        }

        if self.silence_threshold > MAX_VOICE_ERRORS {
            warn!(
                "Silence threshold > {}, defaulting to {}",
                MAX_VOICE_ERRORS, DEFAULT_SILENCE_THRESHOLD
            );
            self.silence_threshold = DEFAULT_SILENCE_THRESHOLD;
        }

        // either MAX_VOICE_ERRORS or 0 disables the threshold logic
        if self.silence_threshold == 0 {
            warn!("Silence threshold set to zero, defaulting to {MAX_VOICE_ERRORS}");
            self.silence_threshold = MAX_VOICE_ERRORS;
        }

        if self.control.enable && self.control.slot != 1 && self.control.slot != 2 {
            error!(
                "DMR, invalid slot, TSCC disabled, slotNo = {}",
                self.control.slot
            );
            self.control.enable = false;
            self.control.dedicated = false;
        }

        if self.queue_size_max == 0 {
            self.queue_size_max = self.queue_size.saturating_mul(4);
        }

        Ok(())
    }

    /// Terminator burst count emitted at end of call.
    pub fn hang_count(&self) -> u32 {
        self.call_hang * 17
    }

    /// Number of idle bursts inserted to absorb network jitter.
    pub fn jitter_slots(&self) -> u32 {
        ((self.jitter as f32) / 360.0).ceil() as u32 * 6
    }
}
