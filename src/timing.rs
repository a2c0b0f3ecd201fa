//! Fixed-rate frame pacing.
//!
//! The event loop sleeps until [`FrameClock::next_frame`] and then calls
//! [`FrameClock::tick`] to obtain the frame delta and the elapsed time.

use std::time::{Duration, Instant};

/// Smallest delta handed to the animation, guarding against zero-length
/// frames when the loop wakes early.
pub const MIN_DT: f32 = 1.0 / 300.0;

/// Timing information for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous frame
    pub dt: f32,
    /// Seconds since the clock started
    pub elapsed: f32,
}

impl FrameTick {
    /// Tick for frame `index` of a perfectly paced run at `rate` Hz.
    pub fn fixed(index: u32, rate: f64) -> Self {
        let rate = rate.max(1.0);
        Self {
            dt: (1.0 / rate) as f32,
            elapsed: (index as f64 / rate) as f32,
        }
    }
}

/// Monotonic clock that schedules frame boundaries at a target rate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    start: Instant,
    last: Instant,
    next_frame: Instant,
}

impl FrameClock {
    pub fn new(rate: f64, now: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / rate.max(1.0));
        Self {
            interval,
            start: now,
            last: now,
            next_frame: now + interval,
        }
    }

    /// Record a frame at `now` and schedule the next boundary.
    ///
    /// When the loop has fallen more than a frame behind, the schedule is
    /// re-anchored to `now` instead of bursting to catch up.
    pub fn tick(&mut self, now: Instant) -> FrameTick {
        let dt = now.saturating_duration_since(self.last).as_secs_f32().max(MIN_DT);
        self.last = now;

        self.next_frame += self.interval;
        if self.next_frame <= now {
            self.next_frame = now + self.interval;
        }

        FrameTick {
            dt,
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
        }
    }

    /// Whether the next frame boundary has been reached.
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_frame
    }

    /// Instant the loop should wake up for the next frame.
    pub fn next_frame(&self) -> Instant {
        self.next_frame
    }
}
