//! Frame-primitive laws: `decode . encode = id` for the burst field codecs,
//! sync idempotence, and the embedded-LC superframe property.

use dmrtrunk_rs::defines::*;
use dmrtrunk_rs::frame::{emb::Emb, short_lc, slot_type::SlotType, sync, EmbeddedData};
use dmrtrunk_rs::frame::{data_header::Dpf, DataHeader};
use dmrtrunk_rs::lc::{full_lc, Lc, PrivacyLc, ServiceOptions};

#[test]
fn slot_type_round_trip_all_codes() {
    for cc in 0..16u8 {
        for dt in [
            DataType::VoicePiHeader,
            DataType::VoiceLcHeader,
            DataType::TerminatorWithLc,
            DataType::Csbk,
            DataType::DataHeader,
            DataType::Rate12Data,
            DataType::Rate34Data,
            DataType::Idle,
            DataType::Rate1Data,
        ] {
            let mut burst = [0u8; FRAME_LENGTH_BYTES];
            SlotType::new(cc, dt).encode(&mut burst);
            let decoded = SlotType::decode(&burst).expect("slot type");
            assert_eq!((decoded.color_code, decoded.data_type), (cc, dt));
        }
    }
}

#[test]
fn data_sync_twice_equals_once() {
    let mut once = [0x55u8; FRAME_LENGTH_BYTES];
    sync::add_data_sync(&mut once, true);
    let mut twice = once;
    sync::add_data_sync(&mut twice, true);
    assert_eq!(once, twice);
}

#[test]
fn voice_sync_overwrites_data_sync() {
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    sync::add_data_sync(&mut burst, false);
    sync::add_voice_sync(&mut burst, false);
    assert_eq!(sync::match_ms_sync(&burst), Some(sync::SyncKind::VoiceSync));
}

#[test]
fn emb_round_trip_and_color_code() {
    for cc in 0..16u8 {
        let emb = Emb {
            color_code: cc,
            pi: cc % 2 == 0,
            lcss: cc & 0x03,
        };
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        emb.encode(&mut burst);
        assert_eq!(Emb::decode(&burst), Some(emb));
    }
}

#[test]
fn short_lc_activity_and_tscc_forms() {
    for message in [
        [SLCO_ACT, 0x88, 0x9C, 0x00],
        [SLCO_ACT, 0x09, 0x00, 0x4D],
        [SLCO_TSCC, 0x12, 0x34, 0x56],
        [SLCO_PAYLOAD, 0x65, 0x43, 0x21],
    ] {
        assert_eq!(short_lc::decode(&short_lc::encode(&message)), Some(message));
    }
}

#[test]
fn full_lc_header_and_terminator_round_trip() {
    let mut lc = Lc::group_voice(0x2A, 0x64);
    lc.options = ServiceOptions::EMERGENCY;

    for dt in [DataType::VoiceLcHeader, DataType::TerminatorWithLc] {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        full_lc::encode(&lc, &mut burst, dt);
        assert_eq!(full_lc::decode(&burst, dt), Some(lc));
    }
}

#[test]
fn full_lc_regeneration_is_byte_stable() {
    // regenerate(burst) == burst for a valid input
    let lc = Lc::group_voice(0x63, 0x1388);
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    full_lc::encode(&lc, &mut burst, DataType::VoiceLcHeader);

    let decoded = full_lc::decode(&burst, DataType::VoiceLcHeader).unwrap();
    let mut regenerated = burst;
    full_lc::encode(&decoded, &mut regenerated, DataType::VoiceLcHeader);
    assert_eq!(regenerated, burst);
}

#[test]
fn privacy_lc_round_trip() {
    let mut pi = PrivacyLc::new(0x64);
    pi.group = true;
    pi.alg_id = 0x02;
    pi.key_id = 0x10;
    pi.mi = [0xDE, 0xAD, 0xBE, 0xEF];

    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    full_lc::encode_pi(&pi, &mut burst);
    assert_eq!(full_lc::decode_pi(&burst), Some(pi));
}

#[test]
fn data_header_round_trip() {
    let header = DataHeader {
        gi: true,
        response_requested: true,
        dpf: Dpf::Unconfirmed,
        sap: 0x03,
        pad_count: 7,
        dst_id: 0x1388,
        src_id: 0x2A,
        full_message: false,
        blocks: 12,
        fsn: 4,
    };
    let mut burst = [0u8; FRAME_LENGTH_BYTES];
    header.encode(&mut burst);
    assert_eq!(DataHeader::decode(&burst), Some(header));
}

#[test]
fn embedded_superframe_recovers_emitting_lc() {
    // feeding a superframe's four fragments recovers (src, dst, flco)
    let lc = Lc::group_voice(0x2A, 0x64);
    let mut tx = EmbeddedData::new();
    tx.set_lc(&lc);

    let mut rx = EmbeddedData::new();
    let mut done = false;
    for n in 1..=4u8 {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        let lcss = tx.get_data(&mut burst, n);
        done = rx.add_data(&burst, lcss);
    }

    assert!(done);
    let decoded = rx.lc().expect("assembled LC");
    assert_eq!(decoded.src_id, lc.src_id);
    assert_eq!(decoded.dst_id, lc.dst_id);
    assert_eq!(decoded.flco, lc.flco);
}

#[test]
fn embedded_fragments_survive_emb_encoding() {
    // EMB re-encoding must not disturb the embedded fragment bits
    let lc = Lc::group_voice(7, 8);
    let mut tx = EmbeddedData::new();
    tx.set_lc(&lc);

    let mut rx = EmbeddedData::new();
    let mut done = false;
    for n in 1..=4u8 {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        let lcss = tx.get_data(&mut burst, n);
        Emb {
            color_code: 1,
            pi: false,
            lcss,
        }
        .encode(&mut burst);
        let emb = Emb::decode(&burst).unwrap();
        done = rx.add_data(&burst, emb.lcss);
    }
    assert!(done);
}
