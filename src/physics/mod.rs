//! Animation state and per-entity kinematics
//!
//! Contains the update rules driven by the animation loop:
//! - Bottle: dimensions and surface placement policies
//! - Fill: saturating liquid level
//! - Waves: ripple ring on the surface
//! - Bubbles, hearts, droplets: rise/respawn and fall/reset loops
//! - Blink: the eye blink automaton
//! - Simulation: owns everything and applies queued commands

pub mod blink;
pub mod bottle;
pub mod bubbles;
pub mod droplets;
pub mod fill;
pub mod hearts;
pub mod simulation;
pub mod waves;

pub use blink::{BlinkState, Blinker};
pub use bottle::BottleGeometry;
pub use bubbles::{Bubble, RiseOutcome};
pub use droplets::{Droplet, FallOutcome};
pub use fill::FillController;
pub use hearts::Heart;
pub use simulation::{Command, Simulation, SimulationHandle};
pub use waves::{WaveMarker, WaveRing};

use rand::Rng;

/// Per-frame inputs shared by every entity update.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Frame delta in seconds
    pub dt: f32,
    /// Elapsed animation time in seconds
    pub time: f32,
    /// Current liquid surface height inside the body
    pub body_surface: f32,
}

/// Uniform sample in `[low, high)`, or `low` when the range is empty.
pub(crate) fn uniform<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}
