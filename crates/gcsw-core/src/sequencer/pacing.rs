// gcsw Pacing
// Frame-based hold durations

use std::time::Duration;

/// Display frames per second the hold durations are expressed in
pub const FRAMES_PER_SECOND: u64 = 60;

/// Convert a hold duration in frames to wall-clock time.
///
/// Computed in microseconds over the whole count, so long holds do not
/// accumulate per-frame rounding (60 frames is exactly one second).
pub fn frame_duration(frames: u32) -> Duration {
    Duration::from_micros(u64::from(frames) * 1_000_000 / FRAMES_PER_SECOND)
}

/// Suspension point of a sequencer between words
pub trait Pacer: Send {
    /// Block the calling worker for `duration`
    fn pause(&mut self, duration: Duration);
}

/// Pacer that sleeps the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_frame_duration() {
        assert_eq!(frame_duration(0), Duration::ZERO);
        assert_eq!(frame_duration(1), Duration::from_micros(16_666));
        assert_eq!(frame_duration(3), Duration::from_millis(50));
        assert_eq!(frame_duration(60), Duration::from_secs(1));
    }

    #[test]
    fn test_thread_pacer_sleeps() {
        let start = Instant::now();
        ThreadPacer.pause(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
