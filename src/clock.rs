//! Fixed-rate tick pacing.

use std::time::{Duration, Instant};

/// Decides when the next frame of a fixed-rate stream is due.
///
/// Falls back into step instead of bursting when it lags more than two
/// intervals behind.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    next_at: Option<Instant>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a frame is due at `now`; advances the schedule if so.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(next_at) = self.next_at else {
            self.next_at = Some(now + self.interval);
            return true;
        };

        if now < next_at {
            return false;
        }

        let mut next = next_at + self.interval;
        if now > next + self.interval * 2 {
            next = now + self.interval;
        }
        self.next_at = Some(next);
        true
    }

    /// When the next frame becomes due (`None` before the first tick)
    pub fn deadline(&self) -> Option<Instant> {
        self.next_at
    }
}
