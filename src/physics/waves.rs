//! Ripple ring markers riding the liquid surface.

use glam::Vec3;
use std::f32::consts::TAU;

use super::bottle::BottleGeometry;
use crate::config::WaveParameters;

/// Levels at or below this leave the ring hidden.
pub const HIDDEN_LEVEL: f32 = 0.01;

/// A single marker sphere on the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveMarker {
    pub position: Vec3,
    pub visible: bool,
}

/// Ring of markers placed around the current surface.
///
/// Holds no state of its own beyond the last computed placement: every
/// update recomputes the ring from the fill level and elapsed time.
#[derive(Debug, Clone)]
pub struct WaveRing {
    markers: Vec<WaveMarker>,
    amplitude: f32,
    marker_radius: f32,
}

impl WaveRing {
    pub fn new(params: &WaveParameters) -> Self {
        Self {
            markers: vec![
                WaveMarker {
                    position: Vec3::ZERO,
                    visible: false,
                };
                params.count
            ],
            amplitude: params.amplitude,
            marker_radius: params.marker_radius,
        }
    }

    /// Reposition every marker for the given fill level at time `t`.
    pub fn update(&mut self, bottle: &BottleGeometry, level: f32, t: f32) {
        if level <= HIDDEN_LEVEL {
            for marker in &mut self.markers {
                marker.visible = false;
            }
            return;
        }

        let radius = bottle.surface_radius(level);
        let height = bottle.surface_height(level);
        let amplitude = if level < bottle.body_height {
            self.amplitude
        } else {
            self.amplitude * 0.5
        };

        let count = self.markers.len() as f32;
        for (i, marker) in self.markers.iter_mut().enumerate() {
            let angle = TAU * (i as f32 / count);
            marker.visible = true;
            marker.position = Vec3::new(
                radius * angle.cos(),
                height + amplitude * (angle * 2.0 + t * 3.0).sin(),
                radius * angle.sin(),
            );
        }
    }

    pub fn markers(&self) -> &[WaveMarker] {
        &self.markers
    }

    pub fn marker_radius(&self) -> f32 {
        self.marker_radius
    }

    pub fn is_visible(&self) -> bool {
        self.markers.iter().any(|marker| marker.visible)
    }
}
