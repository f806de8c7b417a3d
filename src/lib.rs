//! # dmrtrunk-rs - A Rust Crate for DMR Tier-III Trunked Site Control
//!
//! The dmrtrunk-rs crate implements the core of an ETSI DMR Tier-III-style
//! trunking base station: two time-division voice/data timeslots, with one
//! optionally dedicated as a Trunking Site Control Channel (TSCC) that
//! administers registration, affiliation, channel grants and payload-channel
//! activation across a site.
//!
//! ## Features
//!
//! - Bit-accurate DMR burst framing: slot types, sync patterns, embedded
//!   signalling, short LC, full LC and CSBK control blocks
//! - The full FEC kit: BPTC(196,96), Golay(20,8,7), QR(16,7,6), RS(12,9),
//!   the RS(63,47) shortened family, 3/4-rate trellis, Hamming and CRC codes
//! - Per-slot RF and network state machines with traffic-collision policy,
//!   talkgroup hang, session timeouts, jitter repair and silence fill
//! - A TSCC scheduler: beacon rotation, Aloha, grant arbitration with
//!   backpressure, late-entry advertisements and payload-channel activation
//! - A site affiliation store: registrations, group affiliations and
//!   expiring channel grants over a deterministic channel pool
//!
//! The modem byte transport, the peer-network wire protocol and the remote
//! voice-channel admin surface are external collaborators behind the
//! [`modem::ModemPort`], [`network::PeerNetwork`] and
//! [`remote::VoiceChannelCtrl`] traits.
//!
//! ## Usage
//!
//! ```rust
//! use dmrtrunk_rs::{
//!     config::DmrConfig,
//!     control::{DmrControl, DmrIo},
//!     lookups::{RadioIdLookup, TalkgroupRulesLookup},
//!     modem::MockModem,
//!     remote::NullChannelCtrl,
//!     site::{SiteData, SiteModel},
//! };
//!
//! let mut cfg = DmrConfig::default();
//! cfg.validate().unwrap();
//!
//! let site = SiteData::new(SiteModel::Small, 1, 1, false);
//! let mut dmr = DmrControl::new(
//!     cfg,
//!     site,
//!     1,
//!     RadioIdLookup::new(false),
//!     TalkgroupRulesLookup::new(false),
//! );
//!
//! let mut modem = MockModem::new();
//! let mut chan_ctrl = NullChannelCtrl;
//! let mut io = DmrIo {
//!     modem: &mut modem,
//!     network: None,
//!     chan_ctrl: &mut chan_ctrl,
//! };
//!
//! // one millisecond of controller time
//! dmr.clock(1, &mut io);
//! ```

pub mod config;
pub mod control;
pub mod defines;
pub mod edac;
pub mod error;
pub mod frame;
pub mod lc;
pub mod logging;
pub mod lookups;
pub mod modem;
pub mod network;
pub mod remote;
pub mod site;
pub mod slot;
pub mod util;

pub use crate::error::DmrError;
pub use crate::logging::init_logger;

// Core controller types
pub use config::DmrConfig;
pub use control::{DmrControl, DmrIo};
pub use network::{NetData, PeerNetwork};
pub use site::{SiteData, SiteModel};
pub use slot::{NetState, RfState, Slot};

// Link control and framing
pub use lc::{Csbk, Lc, PrivacyLc};
