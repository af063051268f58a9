//! Frame-rate measurement for presenters.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::FrameReceiver;

/// Frames counted over one measurement window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRate {
    /// Frames seen in the window.
    pub frames: u32,
    /// Actual length of the window.
    pub elapsed: Duration,
}

impl FrameRate {
    /// Frames per second over the window.
    #[must_use]
    pub fn per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        f64::from(self.frames) / self.elapsed.as_secs_f64()
    }
}

/// Counts frames and yields a [`FrameRate`] once per window.
#[derive(Debug)]
pub struct FrameRateMeter {
    window: Duration,
    started: Instant,
    frames: u32,
}

impl FrameRateMeter {
    /// One-second windows, starting now.
    #[must_use]
    pub fn new() -> Self { Self::with_window(Duration::from_secs(1), Instant::now()) }

    /// Windows of `window`, starting at `start`.
    #[must_use]
    pub const fn with_window(window: Duration, start: Instant) -> Self {
        Self {
            window,
            started: start,
            frames: 0,
        }
    }

    /// Count a frame now.
    pub fn record(&mut self) -> Option<FrameRate> { self.record_at(Instant::now()) }

    /// Count a frame at `now`, returning the finished window if it elapsed.
    pub fn record_at(&mut self, now: Instant) -> Option<FrameRate> {
        self.frames = self.frames.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.window {
            return None;
        }
        let rate = FrameRate {
            frames: self.frames,
            elapsed,
        };
        self.frames = 0;
        self.started = now;
        Some(rate)
    }
}

impl Default for FrameRateMeter {
    fn default() -> Self { Self::new() }
}

/// Drain `receiver`, logging the frame rate once per second.
///
/// Returns the number of frames consumed once the queue closes.
pub async fn monitor(mut receiver: FrameReceiver) -> u64 {
    let mut meter = FrameRateMeter::new();
    let mut total = 0_u64;
    while let Some(frame) = receiver.recv().await {
        total += 1;
        debug!(len = frame.len(), total, "frame presented");
        if let Some(rate) = meter.record() {
            info!(
                fps = rate.per_second(),
                dropped = receiver.dropped(),
                "presentation rate"
            );
        }
    }
    total
}
