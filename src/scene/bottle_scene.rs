//! Assembles the bottle, its contents and the face into shape instances.
//!
//! The glass, cork, spout and smile never change and are built once. The
//! liquid, wave ring, eyes, hearts, bubbles and droplets are rebuilt from the
//! simulation state every frame.

use glam::{Mat4, Vec3};
use std::f32::consts::PI;

use super::lighting::Lighting;
use super::shapes::{Material, SceneObject, Shape, ShapeInstance};
use crate::config::AnimationConfig;
use crate::physics::{BottleGeometry, Heart, Simulation};

const CORK_COLOR: [f32; 3] = [0.6, 0.35, 0.2];
const SPOUT_COLOR: [f32; 3] = [0.6, 0.6, 0.6];
const FACE_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
const WAVE_COLOR: [f32; 3] = [0.9, 0.95, 1.0];
const BUBBLE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Opacity of the rim and base, a little denser than the walls.
const TRIM_OPACITY: f32 = 0.22;
const SMILE_POINTS: usize = 25;
const SMILE_TUBE: f32 = 0.05;
const EYE_DEPTH: f32 = 0.06;

/// Static scene parts plus the materials of the animated ones.
pub struct BottleScene {
    static_objects: Vec<SceneObject>,
    lighting: Lighting,
    background: [f32; 3],
    liquid: Material,
    droplet: Material,
    wave: Material,
    bubble: Material,
    eye: Material,
    /// Eye centers, left then right
    eye_centers: [Vec3; 2],
    eye_width: f32,
    droplet_radius: f32,
}

impl BottleScene {
    pub fn new(config: &AnimationConfig, bottle: &BottleGeometry) -> Self {
        let glass = Material::translucent(config.bottle.glass_color, config.bottle.glass_opacity)
            .with_shininess(0.9);
        let trim = Material::translucent(config.bottle.glass_color, TRIM_OPACITY);
        let liquid = Material::translucent(config.bottle.liquid_color, config.bottle.liquid_opacity)
            .with_shininess(0.9);

        let face = &config.face;
        let face_depth = bottle.radius_mid + 0.05;

        let mut static_objects = body_segments(bottle, glass);
        static_objects.push(SceneObject::new(
            Shape::Cylinder {
                base: Vec3::new(0.0, bottle.body_height, 0.0),
                axis: Vec3::new(0.0, bottle.neck_height, 0.0),
                radius: bottle.radius_neck,
            },
            glass,
        ));
        static_objects.push(SceneObject::new(
            Shape::Ring {
                center: Vec3::new(0.0, bottle.rim_height(), 0.0),
                axis: Vec3::Y,
                radius: bottle.radius_neck + 0.05,
                thickness: 0.09,
            },
            trim,
        ));
        static_objects.push(SceneObject::new(
            Shape::Cylinder {
                base: Vec3::new(0.0, bottle.rim_height(), 0.0),
                axis: Vec3::new(0.0, 0.7, 0.0),
                radius: bottle.radius_neck * 0.9,
            },
            Material::opaque(CORK_COLOR).with_shininess(0.3),
        ));
        static_objects.push(SceneObject::new(
            Shape::Cylinder {
                base: Vec3::new(0.0, -0.08, 0.0),
                axis: Vec3::new(0.0, 0.08, 0.0),
                radius: bottle.radius_bottom + 0.05,
            },
            trim,
        ));

        let spout = bottle.spout_origin();
        static_objects.push(SceneObject::new(
            Shape::Cylinder {
                base: Vec3::new(spout.x, bottle.rim_height() + 1.1, spout.z),
                axis: Vec3::new(0.0, -0.35, 0.0),
                radius: 0.2,
            },
            Material::translucent(SPOUT_COLOR, 0.9),
        ));
        static_objects.push(SceneObject::new(
            smile(face.smile_height, face.smile_radius, face_depth),
            Material::opaque(FACE_COLOR),
        ));

        let half_separation = face.eye_separation / 2.0;
        Self {
            static_objects,
            lighting: Lighting::default(),
            background: config.scene.background,
            liquid,
            droplet: Material::translucent(config.bottle.liquid_color, 0.9),
            wave: Material::translucent(WAVE_COLOR, 0.8),
            bubble: Material::translucent(BUBBLE_COLOR, 0.6).with_shininess(0.5),
            eye: Material::opaque(FACE_COLOR),
            eye_centers: [
                Vec3::new(-half_separation, face.eye_height, face_depth),
                Vec3::new(half_separation, face.eye_height, face_depth),
            ],
            eye_width: face.eye_size,
            droplet_radius: config.droplets.radius,
        }
    }

    /// Build the scene for the simulation's own configuration.
    pub fn for_simulation(simulation: &Simulation) -> Self {
        Self::new(simulation.config(), simulation.bottle())
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }

    pub fn static_objects(&self) -> &[SceneObject] {
        &self.static_objects
    }

    /// Rebuild `out` with every instance of the current frame.
    pub fn collect(&self, simulation: &Simulation, out: &mut Vec<ShapeInstance>) {
        out.clear();

        for object in &self.static_objects {
            object.emit(out);
        }

        let bottle = simulation.bottle();
        let fill = simulation.fill();
        self.emit(
            &Shape::Cylinder {
                base: Vec3::ZERO,
                axis: Vec3::new(0.0, fill.body_extent(), 0.0),
                radius: bottle.body_inner_radius,
            },
            self.liquid,
            out,
        );
        self.emit(
            &Shape::Cylinder {
                base: Vec3::new(0.0, bottle.body_height, 0.0),
                axis: Vec3::new(0.0, fill.neck_extent(), 0.0),
                radius: bottle.neck_inner_radius,
            },
            self.liquid,
            out,
        );

        let waves = simulation.waves();
        for marker in waves.markers().iter().filter(|marker| marker.visible) {
            self.emit(
                &Shape::Sphere {
                    center: marker.position,
                    radius: waves.marker_radius(),
                },
                self.wave,
                out,
            );
        }

        let eye_size = Vec3::new(self.eye_width, simulation.eye_scale(), EYE_DEPTH);
        for center in self.eye_centers {
            self.emit(&Shape::Ellipsoid { center, size: eye_size }, self.eye, out);
        }

        for heart in simulation.hearts() {
            self.emit(
                &heart_shape(heart),
                Material::translucent(heart.color, 0.9),
                out,
            );
        }

        for bubble in simulation.bubbles() {
            self.emit(
                &Shape::Sphere {
                    center: bubble.position,
                    radius: bubble.radius,
                },
                self.bubble,
                out,
            );
        }

        for droplet in simulation.droplets() {
            self.emit(
                &Shape::Sphere {
                    center: droplet.position,
                    radius: self.droplet_radius,
                },
                self.droplet,
                out,
            );
        }
    }

    /// Convenience wrapper around [`BottleScene::collect`].
    pub fn instances(&self, simulation: &Simulation) -> Vec<ShapeInstance> {
        let mut out = Vec::new();
        self.collect(simulation, &mut out);
        out
    }

    fn emit(&self, shape: &Shape, material: Material, out: &mut Vec<ShapeInstance>) {
        shape.emit(material, Mat4::IDENTITY, out);
    }
}

/// The three stacked, narrowing glass cylinders of the body.
fn body_segments(bottle: &BottleGeometry, glass: Material) -> Vec<SceneObject> {
    let radii = [bottle.radius_bottom, bottle.radius_mid, bottle.radius_top];
    let mut base = 0.0;
    bottle
        .segment_heights
        .iter()
        .zip(radii)
        .map(|(&height, radius)| {
            let object = SceneObject::new(
                Shape::Cylinder {
                    base: Vec3::new(0.0, base, 0.0),
                    axis: Vec3::new(0.0, height, 0.0),
                    radius,
                },
                glass,
            );
            base += height;
            object
        })
        .collect()
}

/// Half-circle arc bowed upward, pressed flat to 40% of its height.
fn smile(height: f32, radius: f32, depth: f32) -> Shape {
    let step = PI / (SMILE_POINTS - 1) as f32;
    let points = (0..SMILE_POINTS)
        .map(|i| {
            let angle = i as f32 * step;
            Vec3::new(
                radius * angle.cos(),
                height - 0.4 + radius * angle.sin() * 0.4,
                depth,
            )
        })
        .collect();
    Shape::Curve {
        points,
        radius: SMILE_TUBE,
    }
}

/// Two lobes and a downward tip, in unit heart scale.
fn heart_parts() -> Vec<Shape> {
    vec![
        Shape::Sphere {
            center: Vec3::new(-0.18, 0.1, 0.0),
            radius: 0.18,
        },
        Shape::Sphere {
            center: Vec3::new(0.18, 0.1, 0.0),
            radius: 0.18,
        },
        Shape::Cone {
            base: Vec3::new(0.0, 0.05, 0.0),
            axis: Vec3::new(0.0, -0.45, 0.0),
            radius: 0.23,
        },
    ]
}

fn heart_shape(heart: &Heart) -> Shape {
    Shape::Compound {
        parts: heart_parts(),
        transform: Mat4::from_scale_rotation_translation(
            Vec3::splat(heart.scale),
            heart.orientation,
            heart.position,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::shapes::MeshKind;
    use crate::timing::FrameTick;

    fn simulation() -> Simulation {
        Simulation::new(AnimationConfig {
            seed: Some(42),
            ..AnimationConfig::default()
        })
    }

    fn count(instances: &[ShapeInstance], mesh: MeshKind) -> usize {
        instances.iter().filter(|i| i.mesh == mesh).count()
    }

    #[test]
    fn test_static_parts() {
        let simulation = simulation();
        let scene = BottleScene::for_simulation(&simulation);
        // 3 body segments, neck, rim, cork, base, spout, smile
        assert_eq!(scene.static_objects().len(), 9);
    }

    #[test]
    fn test_body_segments_stack() {
        let bottle = BottleGeometry::default();
        let segments = body_segments(&bottle, Material::default());
        let Shape::Cylinder { base, axis, .. } = &segments[2].shape else {
            panic!("body segment should be a cylinder");
        };
        assert!((base.y + axis.y - bottle.body_height).abs() < 1e-5);
    }

    #[test]
    fn test_empty_bottle_hides_waves() {
        let simulation = simulation();
        let scene = BottleScene::for_simulation(&simulation);
        let instances = scene.instances(&simulation);

        let wave_color = Material::translucent(WAVE_COLOR, 0.8);
        assert!(!instances.iter().any(|i| i.material == wave_color));
    }

    #[test]
    fn test_instance_counts_after_filling() {
        let mut simulation = simulation();
        for frame in 1..=60 {
            simulation.step(FrameTick::fixed(frame, 60.0));
        }
        let scene = BottleScene::for_simulation(&simulation);
        let instances = scene.instances(&simulation);

        // Hearts are two spheres and a cone each.
        assert_eq!(count(&instances, MeshKind::Cone), 8);
        assert_eq!(count(&instances, MeshKind::Torus), 1);
        // bubbles + droplets + waves + eyes + heart lobes + smile joints
        assert_eq!(
            count(&instances, MeshKind::Sphere),
            20 + 12 + 22 + 2 + 16 + SMILE_POINTS
        );
    }

    #[test]
    fn test_liquid_tracks_fill() {
        let mut simulation = simulation();
        for frame in 1..=60 {
            simulation.step(FrameTick::fixed(frame, 60.0));
        }
        let scene = BottleScene::for_simulation(&simulation);
        let instances = scene.instances(&simulation);

        let liquid = Material::translucent([0.65, 0.85, 1.0], 0.75).with_shininess(0.9);
        let body = instances
            .iter()
            .find(|i| i.material == liquid && i.origin().y.abs() < 1e-6)
            .expect("body liquid instance");
        let top = body.transform.transform_point3(Vec3::Y);
        assert!((top.y - simulation.fill().body_extent()).abs() < 1e-4);
    }

    #[test]
    fn test_eyes_follow_blink_scale() {
        let simulation = simulation();
        let scene = BottleScene::for_simulation(&simulation);
        let instances = scene.instances(&simulation);
        let eye = Material::opaque(FACE_COLOR);
        let eyes: Vec<_> = instances
            .iter()
            .filter(|i| i.material == eye && i.mesh == MeshKind::Sphere)
            .filter(|i| (i.origin().y - 5.5).abs() < 1e-6)
            .collect();
        assert_eq!(eyes.len(), 2);
        let top = eyes[0].transform.transform_point3(Vec3::Y);
        assert!((top.y - (5.5 + simulation.eye_scale() / 2.0)).abs() < 1e-5);
    }

    #[test]
    fn test_smile_endpoints() {
        let Shape::Curve { points, .. } = smile(4.4, 1.1, 2.65) else {
            panic!("smile should be a curve");
        };
        assert_eq!(points.len(), SMILE_POINTS);
        assert!((points[0] - Vec3::new(1.1, 4.0, 2.65)).length() < 1e-5);
        assert!((points[12].y - 4.44).abs() < 1e-5);
        assert!((points[24].x + 1.1).abs() < 1e-5);
    }
}
