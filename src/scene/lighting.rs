//! Scene lights.

use glam::Vec3;

/// A single light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Parallel light travelling along `direction`
    Distant { direction: Vec3, color: [f32; 3] },
    /// Point light at `position`
    Local { position: Vec3, color: [f32; 3] },
}

/// Ambient term plus a small set of lights.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: [f32; 3],
    pub lights: Vec<Light>,
}

impl Lighting {
    /// Soft ambient with one cool distant light and two tinted local lights.
    pub fn soft_studio() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2],
            lights: vec![
                Light::Distant {
                    direction: Vec3::new(-1.0, -1.0, -1.0),
                    color: [0.9, 0.9, 1.0],
                },
                Light::Local {
                    position: Vec3::new(6.0, 12.0, 8.0),
                    color: [1.0, 0.95, 0.95],
                },
                Light::Local {
                    position: Vec3::new(-6.0, 6.0, -8.0),
                    color: [0.9, 1.0, 0.95],
                },
            ],
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::soft_studio()
    }
}
