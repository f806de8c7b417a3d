//! Sync field handling.
//!
//! There is no decode: sync words are matched by Hamming distance against the
//! four MS/BS patterns. On the way out the repeater overwrites the field with
//! the BS-origin pattern in duplex mode, MS-origin otherwise, so a burst can
//! flip direction without touching the rest of the frame.

use crate::defines::{
    BS_SOURCED_DATA_SYNC, BS_SOURCED_VOICE_SYNC, MAX_SYNC_BIT_ERRS, MS_SOURCED_DATA_SYNC,
    MS_SOURCED_VOICE_SYNC, SYNC_MASK,
};

/// Kinds of sync pattern a burst can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    DataSync,
    VoiceSync,
}

/// Overwrites the sync field with a data sync (BS pattern when duplex).
pub fn add_data_sync(burst: &mut [u8], duplex: bool) {
    let pattern = if duplex {
        &BS_SOURCED_DATA_SYNC
    } else {
        &MS_SOURCED_DATA_SYNC
    };
    apply(burst, pattern);
}

/// Overwrites the sync field with a voice sync (BS pattern when duplex).
pub fn add_voice_sync(burst: &mut [u8], duplex: bool) {
    let pattern = if duplex {
        &BS_SOURCED_VOICE_SYNC
    } else {
        &MS_SOURCED_VOICE_SYNC
    };
    apply(burst, pattern);
}

fn apply(burst: &mut [u8], pattern: &[u8; 7]) {
    for i in 0..7 {
        burst[i + 13] = (burst[i + 13] & !SYNC_MASK[i]) | pattern[i];
    }
}

/// Matches the sync field of a burst against the MS-sourced patterns,
/// accepting up to [`MAX_SYNC_BIT_ERRS`] differing bits.
pub fn match_ms_sync(burst: &[u8]) -> Option<SyncKind> {
    let data_errs = distance(burst, &MS_SOURCED_DATA_SYNC);
    let voice_errs = distance(burst, &MS_SOURCED_VOICE_SYNC);

    if data_errs <= MAX_SYNC_BIT_ERRS && data_errs <= voice_errs {
        Some(SyncKind::DataSync)
    } else if voice_errs <= MAX_SYNC_BIT_ERRS {
        Some(SyncKind::VoiceSync)
    } else {
        None
    }
}

/// Bit distance between the burst's sync field and a pattern.
pub fn distance(burst: &[u8], pattern: &[u8; 7]) -> u32 {
    (0..7)
        .map(|i| (((burst[i + 13] ^ pattern[i]) & SYNC_MASK[i]).count_ones()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::FRAME_LENGTH_BYTES;

    #[test]
    fn test_add_sync_idempotent() {
        let mut a = [0u8; FRAME_LENGTH_BYTES];
        add_data_sync(&mut a, true);
        let once = a;
        add_data_sync(&mut a, true);
        assert_eq!(a, once);
    }

    #[test]
    fn test_surrounding_nibbles_preserved() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        burst[13] = 0xF0;
        burst[19] = 0x0F;
        add_voice_sync(&mut burst, true);
        assert_eq!(burst[13] & 0xF0, 0xF0);
        assert_eq!(burst[19] & 0x0F, 0x0F);
    }

    #[test]
    fn test_ms_sync_matched_with_errors() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        add_data_sync(&mut burst, false);
        assert_eq!(match_ms_sync(&burst), Some(SyncKind::DataSync));

        burst[14] ^= 0x21; // two bit errors
        assert_eq!(match_ms_sync(&burst), Some(SyncKind::DataSync));

        let mut voice = [0u8; FRAME_LENGTH_BYTES];
        add_voice_sync(&mut voice, false);
        assert_eq!(match_ms_sync(&voice), Some(SyncKind::VoiceSync));
    }

    #[test]
    fn test_bs_sync_not_taken_for_ms() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        add_data_sync(&mut burst, true);
        assert_eq!(match_ms_sync(&burst), None);
    }

    #[test]
    fn test_direction_flip() {
        let mut burst = [0u8; FRAME_LENGTH_BYTES];
        add_data_sync(&mut burst, false);
        add_data_sync(&mut burst, true);
        assert_eq!(distance(&burst, &BS_SOURCED_DATA_SYNC), 0);
    }
}
