//! Bubbles rising through the liquid body.
//!
//! Each bubble is a tiny state machine: it keeps rising until it crosses
//! the surface margin, at which point it respawns near the bottom. Bubbles
//! never interact, so a frame update is order-independent.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use super::bottle::BottleGeometry;
use super::{StepContext, uniform};
use crate::config::BubbleParameters;

/// Height above the floor where bubbles are released.
pub const SPAWN_HEIGHT: f32 = 0.3;
/// Bubbles respawn once they come this close to the surface.
pub const SURFACE_MARGIN: f32 = 0.2;
/// Distance inside the body radius that triggers a relocation.
pub const WALL_MARGIN: f32 = 0.05;
/// Distance inside the body radius a relocated bubble is placed at.
pub const WALL_INSET: f32 = 0.1;

/// Smallest radius used in the rise-speed divisor.
const MIN_RISE_RADIUS: f32 = 0.05;
/// Scale applied to the inverse-radius rise speed.
const RISE_SCALE: f32 = 0.03;
/// Fraction of the body radius used for the spawn square.
pub const SPAWN_SPREAD: f32 = 0.85;

/// What happened to a bubble during one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiseOutcome {
    /// Still rising inside the liquid
    Rising,
    /// Drifted past the wall and was moved back inside on this tick
    Relocated,
    /// Reached the surface and respawned at the bottom
    Respawned,
}

#[derive(Debug, Clone)]
pub struct Bubble {
    pub position: Vec3,
    pub radius: f32,
    /// Stable per-bubble phase that desynchronizes the drift
    pub phase: f32,
}

impl Bubble {
    /// Create a bubble at a random bottom position with a random size.
    pub fn spawn<R: Rng>(rng: &mut R, bottle: &BottleGeometry, params: &BubbleParameters) -> Self {
        Self {
            position: spawn_position(rng, bottle),
            radius: uniform(rng, params.radius_min, params.radius_max),
            phase: rng.gen_range(0.0..TAU),
        }
    }

    /// Vertical speed; smaller bubbles rise faster.
    pub fn rise_speed(&self, params: &BubbleParameters) -> f32 {
        params.rise_rate / self.radius.max(MIN_RISE_RADIUS) * RISE_SCALE
    }

    /// Advance the bubble by one frame.
    pub fn step<R: Rng>(
        &mut self,
        ctx: &StepContext,
        bottle: &BottleGeometry,
        params: &BubbleParameters,
        rng: &mut R,
    ) -> RiseOutcome {
        self.position.x += (ctx.time * 0.8 + self.phase).sin() * params.drift;
        self.position.z += (ctx.time * 0.6 + self.phase).cos() * params.drift;
        self.position.y += self.rise_speed(params) * ctx.dt;

        let mut outcome = RiseOutcome::Rising;

        let radial = self.position.x.hypot(self.position.z);
        if radial > bottle.body_inner_radius - WALL_MARGIN {
            let angle = rng.gen_range(0.0..TAU);
            let clamped = bottle.body_inner_radius - WALL_INSET;
            self.position.x = clamped * angle.cos();
            self.position.z = clamped * angle.sin();
            outcome = RiseOutcome::Relocated;
        }

        if self.position.y > ctx.body_surface - SURFACE_MARGIN {
            self.position = spawn_position(rng, bottle);
            outcome = RiseOutcome::Respawned;
        }

        outcome
    }

    /// Distance of the bubble from the bottle axis.
    pub fn radial_distance(&self) -> f32 {
        self.position.x.hypot(self.position.z)
    }
}

fn spawn_position<R: Rng>(rng: &mut R, bottle: &BottleGeometry) -> Vec3 {
    let spread = bottle.body_inner_radius * SPAWN_SPREAD;
    Vec3::new(
        uniform(rng, -spread, spread),
        SPAWN_HEIGHT,
        uniform(rng, -spread, spread),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup() -> (StdRng, BottleGeometry, BubbleParameters) {
        (
            StdRng::seed_from_u64(3),
            BottleGeometry::default(),
            BubbleParameters::default(),
        )
    }

    fn ctx(body_surface: f32) -> StepContext {
        StepContext {
            dt: 1.0 / 60.0,
            time: 0.0,
            body_surface,
        }
    }

    #[test]
    fn test_spawn_within_bounds() {
        let (mut rng, bottle, params) = setup();
        for _ in 0..100 {
            let bubble = Bubble::spawn(&mut rng, &bottle, &params);
            assert!((bubble.position.y - SPAWN_HEIGHT).abs() < f32::EPSILON);
            assert!(bubble.radius >= params.radius_min && bubble.radius <= params.radius_max);
            assert!((0.0..TAU).contains(&bubble.phase));
        }
    }

    #[test]
    fn test_smaller_bubbles_rise_faster() {
        let params = BubbleParameters::default();
        let small = Bubble {
            position: Vec3::ZERO,
            radius: 0.05,
            phase: 0.0,
        };
        let large = Bubble {
            radius: 0.09,
            ..small.clone()
        };
        assert!(small.rise_speed(&params) > large.rise_speed(&params));
    }

    #[test]
    fn test_rises_below_surface() {
        let (mut rng, bottle, params) = setup();
        let mut bubble = Bubble {
            position: Vec3::new(0.0, 1.0, 0.0),
            radius: 0.07,
            phase: 0.0,
        };
        let outcome = bubble.step(&ctx(8.0), &bottle, &params, &mut rng);
        assert_eq!(outcome, RiseOutcome::Rising);
        assert!(bubble.position.y > 1.0);
    }

    #[test]
    fn test_relocated_to_wall_inset() {
        let (mut rng, bottle, params) = setup();
        let mut bubble = Bubble {
            position: Vec3::new(bottle.body_inner_radius, 1.0, 0.0),
            radius: 0.07,
            phase: 0.0,
        };
        let outcome = bubble.step(&ctx(8.0), &bottle, &params, &mut rng);
        assert_eq!(outcome, RiseOutcome::Relocated);
        let expected = bottle.body_inner_radius - WALL_INSET;
        assert!((bubble.radial_distance() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_respawns_at_surface() {
        let (mut rng, bottle, params) = setup();
        let mut bubble = Bubble {
            position: Vec3::new(0.0, 4.9, 0.0),
            radius: 0.07,
            phase: 0.0,
        };
        let outcome = bubble.step(&ctx(5.0), &bottle, &params, &mut rng);
        assert_eq!(outcome, RiseOutcome::Respawned);
        assert!((bubble.position.y - SPAWN_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stays_inside_body_over_time() {
        let (mut rng, bottle, params) = setup();
        let mut bubbles: Vec<Bubble> = (0..20)
            .map(|_| Bubble::spawn(&mut rng, &bottle, &params))
            .collect();

        for frame in 0..600 {
            let ctx = StepContext {
                dt: 1.0 / 60.0,
                time: frame as f32 / 60.0,
                body_surface: 10.0,
            };
            for bubble in &mut bubbles {
                bubble.step(&ctx, &bottle, &params, &mut rng);
                assert!(bubble.position.y <= 10.0 - SURFACE_MARGIN + 0.1);
            }
        }
    }
}
