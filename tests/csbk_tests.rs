//! CSBK factory laws: every implemented variant survives an encode/decode
//! round trip structurally intact, even with the slot type and sync fields
//! written over the same burst.

use dmrtrunk_rs::defines::*;
use dmrtrunk_rs::frame::{slot_type::SlotType, sync};
use dmrtrunk_rs::lc::Csbk;

fn round_trip_in_full_burst(csbk: Csbk) {
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    csbk.encode(&mut burst);
    SlotType::new(1, DataType::Csbk).encode(&mut burst);
    sync::add_data_sync(&mut burst, true);

    assert_eq!(Csbk::decode(&burst), Some(csbk), "variant {}", csbk.name());
}

#[test]
fn factory_round_trips_every_variant() {
    let variants = [
        Csbk::Aloha {
            n_rand_wait: DEFAULT_NRAND_WAIT,
            backoff: 1,
            system_identity: 0x0A25,
        },
        Csbk::Broadcast {
            annc_type: BCAST_ANNC_SITE_PARMS,
            system_identity: 0x0A25,
            require_reg: true,
            backoff: 1,
            logical_ch1: 0,
            ann_wd1: false,
        },
        Csbk::Broadcast {
            annc_type: BCAST_ANNC_ANN_WD_TSCC,
            system_identity: 0x3FFF,
            require_reg: false,
            backoff: 15,
            logical_ch1: 0xABC,
            ann_wd1: true,
        },
        Csbk::Broadcast {
            annc_type: BCAST_ANNC_ADJ_SITE,
            system_identity: 0x0001,
            require_reg: false,
            backoff: 2,
            logical_ch1: 0x00F,
            ann_wd1: false,
        },
        Csbk::TvGrant {
            broadcast: false,
            logical_ch: 3,
            slot_no: 1,
            late_entry: false,
            emergency: false,
            src_id: 0x2A,
            dst_id: 0x64,
        },
        Csbk::TvGrant {
            broadcast: true,
            logical_ch: 0x400,
            slot_no: 2,
            late_entry: true,
            emergency: true,
            src_id: 0x123456,
            dst_id: 0x654321,
        },
        Csbk::PvGrant {
            logical_ch: 0x00A,
            slot_no: 2,
            emergency: false,
            src_id: 0x2A,
            dst_id: 0x63,
        },
        Csbk::TdGrant {
            logical_ch: 4,
            slot_no: 1,
            emergency: false,
            src_id: 1,
            dst_id: 2,
        },
        Csbk::PdGrant {
            logical_ch: 5,
            slot_no: 2,
            emergency: true,
            src_id: 3,
            dst_id: 4,
        },
        Csbk::AckRsp {
            response: 1,
            reason: TS_ACK_RSN_MSG,
            src_id: WUID_ALL,
            dst_id: 0x2A,
        },
        Csbk::AckRsp {
            response: 0,
            reason: TS_QUEUED_RSN_NO_RESOURCE,
            src_id: WUID_ALL,
            dst_id: 0x2B,
        },
        Csbk::NackRsp {
            service_kind: SVC_KIND_IND_VOICE_CALL,
            reason: TS_DENY_RSN_PERM_USER_REFUSED,
            src_id: WUID_ALL,
            dst_id: 0x99,
        },
        Csbk::Rand {
            service_kind: SVC_KIND_GRP_VOICE_CALL,
            service_options: 0x80,
            service_extra: 0x01,
            src_id: 0x2A,
            dst_id: 0x64,
        },
        Csbk::Rand {
            service_kind: SVC_KIND_REG_SVC,
            service_options: 0x00,
            service_extra: 0x00,
            src_id: 0x2A,
            dst_id: WUID_REGI,
        },
        Csbk::ExtFnct {
            function: EXT_FNCT_CHECK,
            src_id: 0xFFF1,
            dst_id: 0x42,
        },
        Csbk::ExtFnct {
            function: EXT_FNCT_INHIBIT_ACK,
            src_id: 0x42,
            dst_id: 0xFFF1,
        },
        Csbk::CallAlert {
            src_id: 0x2A,
            dst_id: 0x63,
        },
        Csbk::Preamble {
            data_follows: false,
            gi: true,
            blocks: 2,
            src_id: 0x2A,
            dst_id: 0x64,
        },
        Csbk::Preamble {
            data_follows: true,
            gi: false,
            blocks: 15,
            src_id: 0x2A,
            dst_id: 0x63,
        },
        Csbk::BsDwnAct {
            bs_id: 0x000C07,
            src_id: 0x2A,
        },
        Csbk::GitHash { hash: 0x01020304 },
    ];

    for csbk in variants {
        round_trip_in_full_burst(csbk);
    }
}

#[test]
fn factory_rejects_corrupt_blocks() {
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    Csbk::Aloha {
        n_rand_wait: 8,
        backoff: 1,
        system_identity: 0x0A25,
    }
    .encode(&mut burst);

    for b in burst.iter_mut().take(10) {
        *b = !*b;
    }
    assert_eq!(Csbk::decode(&burst), None);
}

#[test]
fn grant_addressing_accessors() {
    let grant = Csbk::TvGrant {
        broadcast: false,
        logical_ch: 3,
        slot_no: 1,
        late_entry: false,
        emergency: false,
        src_id: 0x2A,
        dst_id: 0x64,
    };
    assert_eq!(grant.src_id(), 0x2A);
    assert_eq!(grant.dst_id(), 0x64);
    assert!(grant.gi());
    assert_eq!(grant.csbko(), CSBKO_TV_GRANT);

    let private = Csbk::PvGrant {
        logical_ch: 3,
        slot_no: 1,
        emergency: false,
        src_id: 0x2A,
        dst_id: 0x63,
    };
    assert!(!private.gi());
}

#[test]
fn preamble_content_accessors() {
    let preamble = Csbk::Preamble {
        data_follows: true,
        gi: false,
        blocks: 6,
        src_id: 1,
        dst_id: 2,
    };
    assert!(preamble.data_content());
    assert_eq!(preamble.cbf(), 6);
}
