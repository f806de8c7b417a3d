//! # Logging and Activity Reporting
//!
//! Log output goes through the `log` facade; [`init_logger`] wires up
//! `env_logger` for binaries and examples. The activity log is the
//! operator-facing line-per-event stream (call starts, call ends, grants,
//! rejections); it is emitted at `info` level under the `activity` target and
//! can additionally be captured in-process, which the integration tests use
//! as their observable.

use std::sync::Mutex;

use log::info;
use once_cell::sync::Lazy;

static ACTIVITY_CAPTURE: Lazy<Mutex<Option<Vec<String>>>> = Lazy::new(|| Mutex::new(None));

/// Initializes the logger with the `env_logger` crate.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(false).try_init();
}

/// Emit an activity log line.
///
/// The message itself names the slot, direction and addressing; the `rf`
/// flag only tags the emitted log record.
///
/// # Arguments
/// * `rf` - true for RF-originated events, false for network-originated
/// * `message` - the formatted event line (slot, event, src/dst)
pub fn activity_log(rf: bool, message: &str) {
    info!(target: "activity", "[{}] {}", if rf { "RF" } else { "NET" }, message);

    let mut capture = ACTIVITY_CAPTURE.lock().expect("activity capture poisoned");
    if let Some(lines) = capture.as_mut() {
        lines.push(message.to_string());
    }
}

/// Begin capturing activity lines in-process (testing aid).
pub fn capture_activity() {
    let mut capture = ACTIVITY_CAPTURE.lock().expect("activity capture poisoned");
    *capture = Some(Vec::new());
}

/// Take all captured activity lines, leaving capture enabled.
pub fn take_activity() -> Vec<String> {
    let mut capture = ACTIVITY_CAPTURE.lock().expect("activity capture poisoned");
    match capture.as_mut() {
        Some(lines) => std::mem::take(lines),
        None => Vec::new(),
    }
}

/// Stop capturing activity lines.
pub fn stop_activity_capture() {
    let mut capture = ACTIVITY_CAPTURE.lock().expect("activity capture poisoned");
    *capture = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_capture_round_trip() {
        capture_activity();
        activity_log(true, "Slot 1 test event from 42 to TG 100");
        activity_log(false, "Slot 2 other event");
        let lines = take_activity();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Slot 1 test event from 42 to TG 100"));
        assert!(lines[1].contains("Slot 2 other event"));
        assert!(take_activity().is_empty());
        stop_activity_capture();
    }
}
