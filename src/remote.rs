//! # Remote Voice Channel Control
//!
//! The TSCC activates payload slots on remote voice channels over their
//! admin surface (HTTP PUT of a JSON body). The core never talks HTTP
//! itself: [`VoiceChannelCtrl`] is the pluggable seam, and the request
//! structs serialize to the exact JSON bodies of the admin endpoints
//! `/dmr/tscc_payload_act` and `/permit_tg`. A non-success result cancels
//! the grant upstream.

use serde::Serialize;

use crate::error::DmrError;
use crate::lookups::VoiceChData;

/// Body of `PUT /dmr/tscc_payload_act` for activation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayloadActRequest {
    pub dst_id: u32,
    pub src_id: u32,
    pub slot: u8,
    pub group: bool,
    pub voice: bool,
}

/// Body of `PUT /dmr/tscc_payload_act` for clearing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayloadClearRequest {
    pub slot: u8,
    pub clear: bool,
}

/// Body of `PUT /permit_tg`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermitTgRequest {
    pub state: u32,
    pub dst_id: u32,
    pub slot: u8,
}

/// Pluggable control surface for remote voice channels.
///
/// Implementations may dispatch synchronously or hand the request to a
/// worker; the core only assumes "Ok means accepted".
pub trait VoiceChannelCtrl {
    fn payload_activate(
        &mut self,
        ch: &VoiceChData,
        req: &PayloadActRequest,
    ) -> Result<(), DmrError>;

    fn payload_clear(&mut self, ch: &VoiceChData, req: &PayloadClearRequest)
        -> Result<(), DmrError>;

    fn permit_tg(&mut self, ch: &VoiceChData, req: &PermitTgRequest) -> Result<(), DmrError>;
}

/// Accept-everything implementation for sites without remote channels.
#[derive(Debug, Default)]
pub struct NullChannelCtrl;

impl VoiceChannelCtrl for NullChannelCtrl {
    fn payload_activate(
        &mut self,
        _ch: &VoiceChData,
        _req: &PayloadActRequest,
    ) -> Result<(), DmrError> {
        Ok(())
    }

    fn payload_clear(
        &mut self,
        _ch: &VoiceChData,
        _req: &PayloadClearRequest,
    ) -> Result<(), DmrError> {
        Ok(())
    }

    fn permit_tg(&mut self, _ch: &VoiceChData, _req: &PermitTgRequest) -> Result<(), DmrError> {
        Ok(())
    }
}

/// A capturing controller for tests; optionally refuses permits.
#[derive(Debug, Default)]
pub struct MockChannelCtrl {
    pub activations: Vec<(u32, PayloadActRequest)>,
    pub clears: Vec<(u32, PayloadClearRequest)>,
    pub permits: Vec<(u32, PermitTgRequest)>,
    pub refuse_permits: bool,
}

impl VoiceChannelCtrl for MockChannelCtrl {
    fn payload_activate(
        &mut self,
        ch: &VoiceChData,
        req: &PayloadActRequest,
    ) -> Result<(), DmrError> {
        self.activations.push((ch.ch_no, req.clone()));
        Ok(())
    }

    fn payload_clear(
        &mut self,
        ch: &VoiceChData,
        req: &PayloadClearRequest,
    ) -> Result<(), DmrError> {
        self.clears.push((ch.ch_no, req.clone()));
        Ok(())
    }

    fn permit_tg(&mut self, ch: &VoiceChData, req: &PermitTgRequest) -> Result<(), DmrError> {
        self.permits.push((ch.ch_no, req.clone()));
        if self.refuse_permits {
            Err(DmrError::RemoteChannel("permit refused".to_string()))
        } else {
            Ok(())
        }
    }
}
