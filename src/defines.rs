//! # DMR Protocol Constants
//!
//! Frame geometry, data types, sync patterns, CSBK opcodes, Tier-III response
//! reasons and the other fixed numbers of the air interface. Everything here
//! is `pub` so the framing, link-control and slot layers share one vocabulary.

/// Length of an on-air DMR burst in bytes.
pub const FRAME_LENGTH_BYTES: usize = 33;
/// Length of an on-air DMR burst in bits.
pub const FRAME_LENGTH_BITS: usize = FRAME_LENGTH_BYTES * 8;

/// Number of bytes spanned by the sync/EMB field (bytes 13..20 of a burst).
pub const SYNC_LENGTH_BYTES: usize = 7;

/// Length of the AMBE payload carried by a voice burst, in bytes (3 x 9).
pub const AMBE_LENGTH_BYTES: usize = 27;

/// Nominal duration of a DMR slot in milliseconds.
pub const SLOT_TIME_MS: u32 = 60;

/// Voice frames per second (1000 / 60ms), used for call duration reporting.
pub const FRAMES_PER_SECOND: f32 = 16.667;

/// Maximum correctable voice bit errors in one burst (the AMBE FEC budget).
pub const MAX_VOICE_ERRORS: u32 = 141;
/// Default silence-fill threshold in bit errors.
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 21;

/// Number of voice LC header copies written in duplex operation.
pub const NO_HEADERS_DUPLEX: u32 = 3;
/// Number of voice LC header copies written in simplex operation.
pub const NO_HEADERS_SIMPLEX: u32 = 5;

/// Number of preamble CSBKs generated when re-expanding a data preamble.
pub const NO_PREAMBLE_CSBK: u8 = 15;

/// Default Aloha random-access wait slots.
pub const DEFAULT_NRAND_WAIT: u8 = 8;

/// Wrap point for the free-running TSCC counter (9 bits).
pub const TSCC_MAX_CSC_CNT: u16 = 511;

/// Grant lifetime in seconds, refreshed on touch.
pub const GRANT_TIMER_TIMEOUT_SECS: u32 = 15;

/// Network watchdog limit in milliseconds.
pub const NET_WATCHDOG_MS: u32 = 1500;

/// Maximum number of PDU blocks buffered for one data call.
pub const MAX_PDU_COUNT: usize = 32;
/// Maximum PDU block length buffered for one data call.
pub const MAX_PDU_LENGTH: usize = 512;

/// All-call talkgroup; acknowledged but never granted or tracked.
pub const WUID_ALL: u32 = 0xFFFF;
/// Registration service identity used as the source of registration ACKs.
pub const WUID_REGI: u32 = 0xFFF2;

// Frame tag bytes prefixed to bursts moving through queues.
pub const TAG_DATA: u8 = 0x01;
pub const TAG_LOST: u8 = 0x02;
pub const TAG_EOT: u8 = 0x03;

// Bits of the per-burst flags byte (second queue byte).
pub const IDLE_RX: u8 = 0x80;
pub const SYNC_DATA: u8 = 0x40;
pub const SYNC_VOICE: u8 = 0x20;

/// Burst data types carried in the slot type (and the flags-byte nibble).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    VoicePiHeader = 0x00,
    VoiceLcHeader = 0x01,
    TerminatorWithLc = 0x02,
    Csbk = 0x03,
    MbcHeader = 0x04,
    MbcContinuation = 0x05,
    DataHeader = 0x06,
    Rate12Data = 0x07,
    Rate34Data = 0x08,
    Idle = 0x09,
    Rate1Data = 0x0A,
    /// Internal pseudo-type for a voice burst carrying sync.
    VoiceSync = 0xF0,
    /// Internal pseudo-type for a voice burst without sync.
    Voice = 0xF1,
}

impl DataType {
    pub fn from_bits(value: u8) -> DataType {
        match value & 0x0F {
            0x00 => DataType::VoicePiHeader,
            0x01 => DataType::VoiceLcHeader,
            0x02 => DataType::TerminatorWithLc,
            0x03 => DataType::Csbk,
            0x04 => DataType::MbcHeader,
            0x05 => DataType::MbcContinuation,
            0x06 => DataType::DataHeader,
            0x07 => DataType::Rate12Data,
            0x08 => DataType::Rate34Data,
            0x0A => DataType::Rate1Data,
            _ => DataType::Idle,
        }
    }

    pub fn as_bits(self) -> u8 {
        self as u8
    }
}

/// Full link control opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flco {
    Group = 0x00,
    Private = 0x03,
    TalkerAliasHeader = 0x04,
    TalkerAliasBlock1 = 0x05,
    TalkerAliasBlock2 = 0x06,
    TalkerAliasBlock3 = 0x07,
    GpsInfo = 0x08,
}

impl Flco {
    pub fn from_bits(value: u8) -> Flco {
        match value & 0x3F {
            0x03 => Flco::Private,
            0x04 => Flco::TalkerAliasHeader,
            0x05 => Flco::TalkerAliasBlock1,
            0x06 => Flco::TalkerAliasBlock2,
            0x07 => Flco::TalkerAliasBlock3,
            0x08 => Flco::GpsInfo,
            _ => Flco::Group,
        }
    }
}

// Feature set IDs.
pub const FID_ETSI: u8 = 0x00;
pub const FID_DMRA: u8 = 0x10;
/// Implementation-defined feature ID used by the build-hash beacon.
pub const FID_DVM: u8 = 0x90;

// CSBK opcodes (6 bits).
pub const CSBKO_UU_V_REQ: u8 = 0x04;
pub const CSBKO_UU_ANS_RSP: u8 = 0x05;
pub const CSBKO_ALOHA: u8 = 0x19;
pub const CSBKO_AHOY: u8 = 0x1C;
/// Random-access ISP; with `FID_DMRA` this opcode is the call alert.
pub const CSBKO_RAND: u8 = 0x1F;
pub const CSBKO_CALL_ALRT: u8 = 0x1F;
pub const CSBKO_ACK_RSP: u8 = 0x20;
pub const CSBKO_EXT_FNCT: u8 = 0x24;
pub const CSBKO_NACK_RSP: u8 = 0x26;
pub const CSBKO_BROADCAST: u8 = 0x28;
pub const CSBKO_P_CLEAR: u8 = 0x2E;
pub const CSBKO_PV_GRANT: u8 = 0x30;
pub const CSBKO_TV_GRANT: u8 = 0x31;
pub const CSBKO_BTV_GRANT: u8 = 0x32;
pub const CSBKO_PD_GRANT: u8 = 0x33;
pub const CSBKO_TD_GRANT: u8 = 0x34;
pub const CSBKO_BSDWNACT: u8 = 0x38;
/// Implementation-defined identification beacon carrying the build hash.
pub const CSBKO_GIT_HASH: u8 = 0x3A;
pub const CSBKO_PRECCSBK: u8 = 0x3D;

// Tier-III response reasons.
pub const TS_WAIT_RSN: u8 = 0x10;
pub const TS_ACK_RSN_MSG: u8 = 0x20;
pub const TS_ACK_RSN_REG: u8 = 0x22;
pub const TS_DENY_RSN_SYS_UNSUPPORTED_SVC: u8 = 0x27;
pub const TS_DENY_RSN_REG_DENIED: u8 = 0x2B;
pub const TS_DENY_RSN_PERM_USER_REFUSED: u8 = 0x2D;
pub const TS_DENY_RSN_TEMP_USER_REFUSED: u8 = 0x2E;
pub const TS_DENY_RSN_TGT_GROUP_NOT_VALID: u8 = 0x30;
pub const TS_DENY_RSN_TGT_BUSY: u8 = 0x32;
pub const TS_QUEUED_RSN_NO_RESOURCE: u8 = 0xA0;

// Random-access service kinds.
pub const SVC_KIND_IND_VOICE_CALL: u8 = 0x00;
pub const SVC_KIND_GRP_VOICE_CALL: u8 = 0x01;
pub const SVC_KIND_IND_DATA_CALL: u8 = 0x02;
pub const SVC_KIND_IND_UDT_DATA_CALL: u8 = 0x03;
pub const SVC_KIND_GRP_DATA_CALL: u8 = 0x04;
pub const SVC_KIND_GRP_UDT_DATA_CALL: u8 = 0x05;
pub const SVC_KIND_REG_SVC: u8 = 0x0C;

// Extended function opcodes; the acknowledge form sets bit 11.
pub const EXT_FNCT_CHECK: u16 = 0x0080;
pub const EXT_FNCT_UNINHIBIT: u16 = 0x007E;
pub const EXT_FNCT_INHIBIT: u16 = 0x007F;
pub const EXT_FNCT_CHECK_ACK: u16 = 0x0880;
pub const EXT_FNCT_UNINHIBIT_ACK: u16 = 0x087E;
pub const EXT_FNCT_INHIBIT_ACK: u16 = 0x087F;

// Short LC opcodes.
pub const SLCO_NULL: u8 = 0x00;
pub const SLCO_ACT: u8 = 0x01;
pub const SLCO_TSCC: u8 = 0x02;
pub const SLCO_PAYLOAD: u8 = 0x03;

// Broadcast announcement types.
pub const BCAST_ANNC_SITE_PARMS: u8 = 0x00;
pub const BCAST_ANNC_ANN_WD_TSCC: u8 = 0x01;
pub const BCAST_ANNC_ADJ_SITE: u8 = 0x02;

/// 48-bit sync patterns expressed over bytes 13..20 of a burst; the leading
/// and trailing nibbles belong to neighbouring fields and are masked out.
pub const BS_SOURCED_DATA_SYNC: [u8; 7] = [0x0D, 0xFF, 0x57, 0xD7, 0x5D, 0xF5, 0xD0];
pub const BS_SOURCED_VOICE_SYNC: [u8; 7] = [0x07, 0x55, 0xFD, 0x7D, 0xF7, 0x5F, 0x70];
pub const MS_SOURCED_DATA_SYNC: [u8; 7] = [0x0D, 0x5D, 0x7F, 0x77, 0xFD, 0x75, 0x70];
pub const MS_SOURCED_VOICE_SYNC: [u8; 7] = [0x07, 0xF7, 0xD5, 0xDD, 0x57, 0xDF, 0xD0];
pub const SYNC_MASK: [u8; 7] = [0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF0];

/// Maximum accepted Hamming distance when matching a sync word.
pub const MAX_SYNC_BIT_ERRS: u32 = 6;

/// One AMBE frame of encoded silence.
pub const NULL_AMBE: [u8; 9] = [0xB9, 0xE8, 0x81, 0x52, 0x61, 0x73, 0x00, 0x2A, 0x6B];
