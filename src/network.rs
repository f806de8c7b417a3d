//! # Network Glue
//!
//! [`NetData`] is the per-burst record exchanged with the peer network, and
//! [`PeerNetwork`] the seam behind which the wire protocol (framing, auth,
//! pings) lives. The byte codec here covers only the DMR record itself; the
//! outer protocol is an external collaborator.

use bytes::{Buf, BufMut};

use crate::defines::{DataType, Flco, FRAME_LENGTH_BYTES};

/// Record magic for a packed DMR frame.
const NET_DATA_MAGIC: &[u8; 4] = b"DMRD";
/// Packed record length: magic + fixed fields + payload.
pub const NET_DATA_LENGTH: usize = 4 + 13 + FRAME_LENGTH_BYTES;

/// One DMR burst moving over the peer network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetData {
    pub slot_no: u8,
    pub data_type: DataType,
    pub src_id: u32,
    pub dst_id: u32,
    pub flco: Flco,
    /// Voice superframe index.
    pub n: u8,
    pub seq_no: u8,
    pub ber: u8,
    pub rssi: u8,
    pub payload: [u8; FRAME_LENGTH_BYTES],
}

impl NetData {
    pub fn new(slot_no: u8, data_type: DataType) -> Self {
        NetData {
            slot_no,
            data_type,
            src_id: 0,
            dst_id: 0,
            flco: Flco::Group,
            n: 0,
            seq_no: 0,
            ber: 0,
            rssi: 0,
            payload: [0u8; FRAME_LENGTH_BYTES],
        }
    }

    /// Packs the record for the peer wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NET_DATA_LENGTH);
        buf.put_slice(NET_DATA_MAGIC);
        buf.put_u8(self.slot_no);
        buf.put_u8(self.data_type.as_bits());
        buf.put_u8(self.flco as u8);
        buf.put_u8(self.n);
        buf.put_u8(self.seq_no);
        buf.put_u8(self.ber);
        buf.put_u8(self.rssi);
        buf.put_uint(u64::from(self.src_id), 3);
        buf.put_uint(u64::from(self.dst_id), 3);
        buf.put_slice(&self.payload);
        buf
    }

    /// Unpacks a record from the peer wire.
    pub fn from_bytes(mut data: &[u8]) -> Option<NetData> {
        if data.len() < NET_DATA_LENGTH || &data[..4] != NET_DATA_MAGIC {
            return None;
        }
        data.advance(4);

        let slot_no = data.get_u8();
        let data_type = data.get_u8();
        let flco = Flco::from_bits(data.get_u8());
        let n = data.get_u8();
        let seq_no = data.get_u8();
        let ber = data.get_u8();
        let rssi = data.get_u8();
        let src_id = data.get_uint(3) as u32;
        let dst_id = data.get_uint(3) as u32;

        let mut payload = [0u8; FRAME_LENGTH_BYTES];
        payload.copy_from_slice(&data[..FRAME_LENGTH_BYTES]);

        // the internal voice pseudo-types ride the wire verbatim
        let data_type = if data_type >= 0xF0 {
            if data_type == 0xF0 {
                DataType::VoiceSync
            } else {
                DataType::Voice
            }
        } else {
            DataType::from_bits(data_type)
        };

        Some(NetData {
            slot_no,
            data_type,
            src_id,
            dst_id,
            flco,
            n,
            seq_no,
            ber,
            rssi,
            payload,
        })
    }
}

/// The peer network message bus.
pub trait PeerNetwork {
    /// Hands an RF-originated burst to the peer network.
    fn write_frame(&mut self, data: &NetData) -> bool;

    /// Writes a grant request on behalf of a non-authoritative host.
    fn write_grant_req(&mut self, src_id: u32, dst_id: u32, slot_no: u8, unit_to_unit: bool)
        -> bool;

    /// Resets per-slot stream state after a call ends locally.
    fn reset_slot(&mut self, slot_no: u8);

    /// True while the peer link is up.
    fn is_running(&self) -> bool;
}

/// A capturing peer network for tests and bring-up.
#[derive(Debug, Default)]
pub struct MockPeerNetwork {
    pub frames: Vec<NetData>,
    pub grant_reqs: Vec<(u32, u32, u8, bool)>,
    pub resets: Vec<u8>,
    pub running: bool,
}

impl MockPeerNetwork {
    pub fn new() -> Self {
        MockPeerNetwork {
            running: true,
            ..Default::default()
        }
    }
}

impl PeerNetwork for MockPeerNetwork {
    fn write_frame(&mut self, data: &NetData) -> bool {
        self.frames.push(data.clone());
        true
    }

    fn write_grant_req(
        &mut self,
        src_id: u32,
        dst_id: u32,
        slot_no: u8,
        unit_to_unit: bool,
    ) -> bool {
        self.grant_reqs.push((src_id, dst_id, slot_no, unit_to_unit));
        true
    }

    fn reset_slot(&mut self, slot_no: u8) {
        self.resets.push(slot_no);
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_data_round_trip() {
        let mut data = NetData::new(1, DataType::VoiceLcHeader);
        data.src_id = 0x2A;
        data.dst_id = 0x64;
        data.flco = Flco::Group;
        data.n = 3;
        data.seq_no = 200;
        data.ber = 4;
        data.rssi = 91;
        data.payload[0] = 0xAB;
        data.payload[32] = 0xCD;

        let packed = data.to_bytes();
        assert_eq!(packed.len(), NET_DATA_LENGTH);
        assert_eq!(NetData::from_bytes(&packed), Some(data));
    }

    #[test]
    fn test_pseudo_types_survive() {
        for dt in [DataType::VoiceSync, DataType::Voice] {
            let data = NetData::new(2, dt);
            let decoded = NetData::from_bytes(&data.to_bytes()).unwrap();
            assert_eq!(decoded.data_type, dt);
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut packed = NetData::new(1, DataType::Csbk).to_bytes();
        packed[0] = b'X';
        assert_eq!(NetData::from_bytes(&packed), None);
        assert_eq!(NetData::from_bytes(&packed[..10]), None);
    }
}
