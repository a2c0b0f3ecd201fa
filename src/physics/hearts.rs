//! Heart decorations floating up through the liquid.

use glam::{Quat, Vec3};
use rand::Rng;
use rand::seq::SliceRandom;
use std::f32::consts::TAU;

use super::bottle::BottleGeometry;
use super::bubbles::RiseOutcome;
use super::{StepContext, uniform};
use crate::config::HeartParameters;

/// Lowest initial spawn height.
pub const INITIAL_HEIGHT_MIN: f32 = 0.4;
/// Highest initial spawn height.
pub const INITIAL_HEIGHT_MAX: f32 = 4.0;
/// Height hearts come back at after reaching the surface.
pub const RESPAWN_HEIGHT: f32 = 0.6;
/// Hearts respawn once they come this close to the surface.
pub const SURFACE_MARGIN: f32 = 0.4;

/// Fraction of the body radius hearts spread across.
pub const SPAWN_SPREAD: f32 = 0.75;
/// Half-depth of the slab hearts float in.
pub const DEPTH_SPREAD: f32 = 0.25;

const FALLBACK_COLOR: [f32; 3] = [1.0, 0.6, 0.8];

#[derive(Debug, Clone)]
pub struct Heart {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub color: [f32; 3],
}

impl Heart {
    /// Create a heart in the lower part of the liquid with a random size,
    /// color and heading.
    pub fn spawn<R: Rng>(rng: &mut R, bottle: &BottleGeometry, params: &HeartParameters) -> Self {
        let height = uniform(rng, INITIAL_HEIGHT_MIN, INITIAL_HEIGHT_MAX);
        let color = params
            .colors
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK_COLOR);

        Self {
            position: spawn_position(rng, bottle, height),
            orientation: Quat::from_rotation_y(rng.gen_range(0.0..TAU)),
            scale: uniform(rng, params.scale_min, params.scale_max),
            color,
        }
    }

    /// Advance the heart by one frame.
    ///
    /// Rotation is applied about the world axes so the spin stays level no
    /// matter how far the heart has tumbled.
    pub fn step<R: Rng>(
        &mut self,
        ctx: &StepContext,
        bottle: &BottleGeometry,
        params: &HeartParameters,
        rng: &mut R,
    ) -> RiseOutcome {
        self.position.y += params.rise_speed * ctx.dt;

        let yaw = Quat::from_rotation_y(params.yaw_rate * ctx.dt);
        let tilt = Quat::from_rotation_x(params.tilt_rate * ctx.dt);
        self.orientation = (tilt * yaw * self.orientation).normalize();

        if self.position.y > ctx.body_surface - SURFACE_MARGIN {
            self.position = spawn_position(rng, bottle, RESPAWN_HEIGHT);
            return RiseOutcome::Respawned;
        }

        RiseOutcome::Rising
    }
}

fn spawn_position<R: Rng>(rng: &mut R, bottle: &BottleGeometry, height: f32) -> Vec3 {
    let spread = bottle.body_inner_radius * SPAWN_SPREAD;
    Vec3::new(
        uniform(rng, -spread, spread),
        height,
        uniform(rng, -DEPTH_SPREAD, DEPTH_SPREAD),
    )
}
