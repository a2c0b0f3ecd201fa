//! Bottle dimensions and the liquid surface placement policies.

use glam::Vec3;

use crate::config::BottleParameters;

/// Fraction of the body height taken by the lower segment.
pub const LOWER_SEGMENT_FRACTION: f32 = 0.42;
/// Fraction of the body height taken by the middle segment.
pub const MIDDLE_SEGMENT_FRACTION: f32 = 0.38;

/// Height of the spout origin above the rim.
const SPOUT_CLEARANCE: f32 = 0.8;
/// Horizontal offset of the pour stream so it stays visible next to the cork.
const SPOUT_OFFSET_X: f32 = 0.15;

/// Derived bottle geometry.
///
/// The bottle stands on the ground plane (`y = 0`) with its axis along +Y.
#[derive(Debug, Clone)]
pub struct BottleGeometry {
    pub body_height: f32,
    pub neck_height: f32,
    pub radius_bottom: f32,
    pub radius_mid: f32,
    pub radius_top: f32,
    pub radius_neck: f32,
    pub wall: f32,
    /// Heights of the three tapered body segments, bottom to top
    pub segment_heights: [f32; 3],
    /// Radius the liquid body (and everything inside it) is kept within
    pub body_inner_radius: f32,
    /// Radius of the liquid column inside the neck
    pub neck_inner_radius: f32,
}

impl BottleGeometry {
    pub fn new(params: &BottleParameters) -> Self {
        let lower = params.body_height * LOWER_SEGMENT_FRACTION;
        let middle = params.body_height * MIDDLE_SEGMENT_FRACTION;
        let upper = params.body_height - lower - middle;

        Self {
            body_height: params.body_height,
            neck_height: params.neck_height,
            radius_bottom: params.radius_bottom,
            radius_mid: params.radius_mid,
            radius_top: params.radius_top,
            radius_neck: params.radius_neck,
            wall: params.wall,
            segment_heights: [lower, middle, upper],
            body_inner_radius: params.radius_mid - params.wall - 0.1,
            neck_inner_radius: params.radius_neck - params.wall - 0.05,
        }
    }

    /// Total fillable height (body plus neck).
    pub fn level_max(&self) -> f32 {
        self.body_height + self.neck_height
    }

    /// Height of the rim on top of the neck.
    pub fn rim_height(&self) -> f32 {
        self.body_height + self.neck_height
    }

    /// Where droplets are released from.
    pub fn spout_origin(&self) -> Vec3 {
        Vec3::new(SPOUT_OFFSET_X, self.rim_height() + SPOUT_CLEARANCE, 0.0)
    }

    /// Radius used to place the wave ring at the given fill level.
    ///
    /// Each body segment uses a hard-coded radius rather than interpolating
    /// along the taper; the neck uses its inner radius.
    pub fn surface_radius(&self, level: f32) -> f32 {
        let [lower, middle, _] = self.segment_heights;

        if level <= 0.0 {
            return self.body_inner_radius;
        }
        if level < self.body_height {
            if level < lower {
                (self.radius_bottom - self.wall - 0.15).min(self.body_inner_radius + 0.25)
            } else if level < lower + middle {
                self.body_inner_radius
            } else {
                (self.radius_top - self.wall - 0.1).min(self.body_inner_radius)
            }
        } else {
            self.neck_inner_radius
        }
    }

    /// Height of the visible liquid surface, including the neck column.
    pub fn surface_height(&self, level: f32) -> f32 {
        if level <= self.body_height {
            level.min(self.body_height)
        } else {
            self.body_height + (level - self.body_height).min(self.neck_height)
        }
    }

    /// Height of the liquid surface inside the body.
    ///
    /// Bubbles, hearts and droplets only live in the body, so once the body
    /// is full their ceiling stays at the top of the body.
    pub fn body_surface_height(&self, level: f32) -> f32 {
        level.clamp(0.0, self.body_height)
    }
}

impl Default for BottleGeometry {
    fn default() -> Self {
        Self::new(&BottleParameters::default())
    }
}
