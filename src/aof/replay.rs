//! AOF replay
//!
//! Handles replaying AOF frames to reconstruct the database state.

use crate::protocol::RespValue;
use tracing::{debug, info, warn};

/// Replay AOF frames through `apply`
///
/// `apply` runs a frame the way a live request would run, minus the reply
/// and minus journaling. A frame whose command fails is logged and skipped.
/// Returns the number of frames that applied cleanly.
pub fn replay_frames<F>(frames: Vec<RespValue>, mut apply: F) -> usize
where
    F: FnMut(&RespValue) -> RespValue,
{
    let total = frames.len();
    let mut replayed = 0;

    for (index, frame) in frames.iter().enumerate() {
        match apply(frame) {
            RespValue::Error(e) => {
                warn!("Failed to replay AOF frame #{}: {}. Skipping.", index, e);
            }
            response => {
                debug!("Replayed AOF frame #{}: {}", index, response);
                replayed += 1;
            }
        }
    }

    info!("Successfully replayed {}/{} AOF frames", replayed, total);
    replayed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_frames_are_skipped() {
        let frames = vec![
            RespValue::command(["SET", "a", "1"]),
            RespValue::command(["BOGUS"]),
            RespValue::command(["SET", "b", "2"]),
        ];

        let mut seen = Vec::new();
        let replayed = replay_frames(frames, |frame| {
            seen.push(frame.clone());
            match frame.as_array().and_then(|parts| parts[0].as_bulk_string()) {
                Some(name) if &name[..] == b"SET" => RespValue::simple_string("OK"),
                _ => RespValue::error("ERR invalid command"),
            }
        });

        assert_eq!(replayed, 2);
        assert_eq!(seen.len(), 3);
    }
}
