//! Two-state blink automaton driving the eye squash.

use crate::config::BlinkParameters;

/// Smallest delta used to scale the squash step.
const MIN_SQUASH_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    Open,
    Blinking,
}

/// Eye blink timer and the shared vertical eye scale.
#[derive(Debug, Clone)]
pub struct Blinker {
    state: BlinkState,
    timer: f32,
    eye_scale: f32,
    params: BlinkParameters,
}

impl Blinker {
    pub fn new(params: BlinkParameters) -> Self {
        Self {
            state: BlinkState::Open,
            timer: 0.0,
            eye_scale: params.open_scale,
            params,
        }
    }

    /// Advance the automaton by one frame.
    ///
    /// `Open` accumulates idle time until the interval elapses. `Blinking`
    /// squashes the eyes toward the floor, and once they are shut the
    /// following update snaps them open again.
    pub fn update(&mut self, dt: f32) {
        self.timer += dt;

        if self.state == BlinkState::Open && self.timer >= self.params.interval {
            self.state = BlinkState::Blinking;
            self.timer = 0.0;
        }

        if self.state == BlinkState::Blinking {
            if self.eye_scale <= self.params.reopen_threshold {
                self.eye_scale = self.params.open_scale;
                self.state = BlinkState::Open;
            } else {
                let squash = self.params.squash_rate / dt.max(MIN_SQUASH_DT);
                self.eye_scale = (self.eye_scale - squash).max(self.params.min_scale);
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = BlinkState::Open;
        self.timer = 0.0;
        self.eye_scale = self.params.open_scale;
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Current vertical scale of both eyes.
    pub fn eye_scale(&self) -> f32 {
        self.eye_scale
    }

    pub fn params(&self) -> &BlinkParameters {
        &self.params
    }
}
