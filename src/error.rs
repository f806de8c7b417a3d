//! # DMR Error Handling
//!
//! This module defines the [`DmrError`] enum covering the error kinds the
//! trunking core can surface. Per-burst decode failures in the hot path are
//! reported through `Option`/`bool` returns and counters rather than errors;
//! `DmrError` covers the operations with a caller that can meaningfully react
//! (configuration, grants, remote channel control, queue I/O).

use thiserror::Error;

/// Represents the different error types that can occur in the DMR trunking core.
#[derive(Debug, Error)]
pub enum DmrError {
    /// Indicates an invalid configuration value detected at initialization.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Indicates an invalid DMR slot number was passed to a slot-routed operation.
    #[error("Invalid slot number: {0}")]
    InvalidSlot(u32),

    /// Indicates a frame failed FEC or CRC validation.
    #[error("Error decoding DMR frame: {0}")]
    FrameDecode(&'static str),

    /// Indicates the TX frame queue rejected a frame.
    #[error("Frame queue overflow: free {free}, needed {needed}")]
    QueueOverflow { free: usize, needed: usize },

    /// Indicates a grant could not be allocated.
    #[error("No RF channel resource available for grant, dstId = {0}")]
    NoResource(u32),

    /// Indicates the remote voice channel refused or failed an activation request.
    #[error("Remote voice channel control failed: {0}")]
    RemoteChannel(String),

    /// Indicates a peer network write failed.
    #[error("Peer network error: {0}")]
    Network(String),
}
