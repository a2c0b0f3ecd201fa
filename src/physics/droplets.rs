//! Droplets falling from the spout into the liquid.
//!
//! The pour is decorative: droplets loop forever between the spout and the
//! surface and never contribute to the fill level.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use super::bottle::BottleGeometry;
use super::{StepContext, uniform};
use crate::config::DropletParameters;

/// Droplets reset once they fall within this distance of the surface.
pub const SURFACE_MARGIN: f32 = 0.05;

/// What happened to a droplet during one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallOutcome {
    /// Still in the air
    Falling,
    /// Hit the surface and went back to the spout
    Reset,
}

#[derive(Debug, Clone)]
pub struct Droplet {
    pub position: Vec3,
    pub velocity: f32,
    /// Stable per-droplet phase that desynchronizes the wiggle
    pub phase: f32,
}

impl Droplet {
    /// Create droplet `index` of the initial column stacked above the spout.
    pub fn spawn<R: Rng>(
        rng: &mut R,
        bottle: &BottleGeometry,
        params: &DropletParameters,
        index: usize,
    ) -> Self {
        Self {
            position: bottle.spout_origin() + Vec3::new(0.0, index as f32 * params.spacing, 0.0),
            velocity: 0.0,
            phase: rng.gen_range(0.0..TAU),
        }
    }

    /// Integrate one frame of free fall (explicit Euler).
    ///
    /// The droplet splashes into the body surface of `ctx`.
    pub fn step<R: Rng>(
        &mut self,
        ctx: &StepContext,
        bottle: &BottleGeometry,
        params: &DropletParameters,
        rng: &mut R,
    ) -> FallOutcome {
        self.velocity += params.gravity * ctx.dt;
        self.position.y += self.velocity * ctx.dt;

        self.position.x += (ctx.time * 3.0 + self.phase).sin() * params.wiggle;
        self.position.z += (ctx.time * 2.0 + self.phase).cos() * params.wiggle;

        if self.position.y <= ctx.body_surface + SURFACE_MARGIN {
            self.position = bottle.spout_origin()
                + Vec3::new(
                    uniform(rng, -params.jitter, params.jitter),
                    0.0,
                    uniform(rng, -params.jitter, params.jitter),
                );
            self.velocity = 0.0;
            return FallOutcome::Reset;
        }

        FallOutcome::Falling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup() -> (StdRng, BottleGeometry, DropletParameters) {
        (
            StdRng::seed_from_u64(5),
            BottleGeometry::default(),
            DropletParameters::default(),
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
    fn test_initial_column() {
        let (mut rng, bottle, params) = setup();
        let third = Droplet::spawn(&mut rng, &bottle, &params, 3);
        let expected = bottle.spout_origin().y + 3.0 * params.spacing;
        assert!((third.position.y - expected).abs() < 1e-5);
        assert_eq!(third.velocity, 0.0);
    }

    #[test]
    fn test_accelerates_downward() {
        let (mut rng, bottle, params) = setup();
        let ctx = ctx(0.0);
        let mut droplet = Droplet::spawn(&mut rng, &bottle, &params, 0);
        let start = droplet.position.y;

        droplet.step(&ctx, &bottle, &params, &mut rng);
        let first_drop = start - droplet.position.y;
        let mid = droplet.position.y;
        droplet.step(&ctx, &bottle, &params, &mut rng);
        let second_drop = mid - droplet.position.y;

        assert!(droplet.velocity < 0.0);
        assert!(second_drop > first_drop);
        assert!((droplet.velocity - 2.0 * params.gravity * ctx.dt).abs() < 1e-5);
    }

    #[test]
    fn test_reset_at_surface_has_zero_velocity() {
        let (mut rng, bottle, params) = setup();
        let mut droplet = Droplet {
            position: Vec3::new(0.15, 3.0, 0.0),
            velocity: -5.0,
            phase: 0.0,
        };

        let outcome = droplet.step(&ctx(3.0), &bottle, &params, &mut rng);

        assert_eq!(outcome, FallOutcome::Reset);
        assert_eq!(droplet.velocity, 0.0);
        let spout = bottle.spout_origin();
        assert!((droplet.position.y - spout.y).abs() < f32::EPSILON);
        assert!((droplet.position.x - spout.x).abs() <= params.jitter + 1e-6);
        assert!(droplet.position.z.abs() <= params.jitter + 1e-6);
    }

    #[test]
    fn test_splashes_into_body_surface() {
        let (mut rng, bottle, params) = setup();
        let mut droplet = Droplet {
            position: Vec3::new(0.15, 4.0, 0.0),
            velocity: 0.0,
            phase: 0.0,
        };

        assert_eq!(
            droplet.step(&ctx(1.0), &bottle, &params, &mut rng),
            FallOutcome::Falling
        );
        droplet.position.y = 4.0;
        droplet.velocity = 0.0;
        assert_eq!(
            droplet.step(&ctx(4.0), &bottle, &params, &mut rng),
            FallOutcome::Reset
        );
    }

    #[test]
    fn test_pours_forever() {
        let (mut rng, bottle, params) = setup();
        let mut droplet = Droplet::spawn(&mut rng, &bottle, &params, 0);
        let ctx = ctx(2.0);
        let mut resets = 0;

        for _ in 0..600 {
            if droplet.step(&ctx, &bottle, &params, &mut rng) == FallOutcome::Reset {
                resets += 1;
            }
            assert!(droplet.position.y > 2.0 + SURFACE_MARGIN);
        }

        assert!(resets >= 2, "droplet should loop repeatedly, got {}", resets);
    }
}
