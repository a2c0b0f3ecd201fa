//! Primitive shape descriptors and their expansion into mesh instances.
//!
//! Every shape is described the way a scene author thinks about it (a
//! cylinder from a base point along an axis, a ring around an axis, an
//! ellipsoid with a size) and is expanded into one or more
//! [`ShapeInstance`]s: a unit mesh plus a model transform.

use glam::{Mat4, Quat, Vec3};

/// Unit meshes the renderer keeps on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKind {
    /// Unit sphere centered at the origin
    Sphere,
    /// Unit-radius cylinder from y = 0 to y = 1, capped
    Cylinder,
    /// Unit-radius cone with its base at y = 0 and apex at y = 1
    Cone,
    /// Torus around the Y axis with major radius 1
    Torus,
}

impl MeshKind {
    pub const ALL: [MeshKind; 4] = [
        MeshKind::Sphere,
        MeshKind::Cylinder,
        MeshKind::Cone,
        MeshKind::Torus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Tube radius of the unit torus relative to its major radius.
pub const TORUS_TUBE_RATIO: f32 = 0.05;

/// Surface appearance shared by every part of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
    pub shininess: f32,
}

impl Material {
    pub const DEFAULT_SHININESS: f32 = 0.6;

    pub fn opaque(color: [f32; 3]) -> Self {
        Self {
            color,
            opacity: 1.0,
            shininess: Self::DEFAULT_SHININESS,
        }
    }

    pub fn translucent(color: [f32; 3], opacity: f32) -> Self {
        Self {
            color,
            opacity,
            shininess: Self::DEFAULT_SHININESS,
        }
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::opaque([1.0, 1.0, 1.0])
    }
}

/// A shape in world (or compound-local) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Solid cylinder from `base` along `axis`
    Cylinder { base: Vec3, axis: Vec3, radius: f32 },
    /// Thin ring centered at `center` around `axis`; `thickness` is the tube diameter
    Ring {
        center: Vec3,
        axis: Vec3,
        radius: f32,
        thickness: f32,
    },
    Sphere { center: Vec3, radius: f32 },
    /// Cone with its base disc at `base` and apex at `base + axis`
    Cone { base: Vec3, axis: Vec3, radius: f32 },
    /// Axis-aligned ellipsoid; `size` holds the full extents
    Ellipsoid { center: Vec3, size: Vec3 },
    /// Tube through a polyline
    Curve { points: Vec<Vec3>, radius: f32 },
    /// Group of parts placed by a common transform
    Compound { parts: Vec<Shape>, transform: Mat4 },
}

/// One instanced draw: a unit mesh, its model matrix and material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeInstance {
    pub mesh: MeshKind,
    pub transform: Mat4,
    pub material: Material,
}

impl ShapeInstance {
    /// World-space position of the mesh origin.
    pub fn origin(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

impl Shape {
    /// Append the instances that draw this shape, placed by `parent`.
    pub fn emit(&self, material: Material, parent: Mat4, out: &mut Vec<ShapeInstance>) {
        let mut push = |mesh, transform: Mat4| {
            out.push(ShapeInstance {
                mesh,
                transform: parent * transform,
                material,
            });
        };

        match self {
            Shape::Cylinder { base, axis, radius } => {
                if let Some(transform) = along_axis(*base, *axis, *radius) {
                    push(MeshKind::Cylinder, transform);
                }
            }
            Shape::Cone { base, axis, radius } => {
                if let Some(transform) = along_axis(*base, *axis, *radius) {
                    push(MeshKind::Cone, transform);
                }
            }
            Shape::Ring {
                center,
                axis,
                radius,
                thickness,
            } => {
                let scale = Vec3::new(
                    *radius,
                    *thickness / (2.0 * TORUS_TUBE_RATIO),
                    *radius,
                );
                push(
                    MeshKind::Torus,
                    Mat4::from_scale_rotation_translation(scale, rotation_to(*axis), *center),
                );
            }
            Shape::Sphere { center, radius } => {
                push(
                    MeshKind::Sphere,
                    Mat4::from_scale_rotation_translation(
                        Vec3::splat(*radius),
                        Quat::IDENTITY,
                        *center,
                    ),
                );
            }
            Shape::Ellipsoid { center, size } => {
                push(
                    MeshKind::Sphere,
                    Mat4::from_scale_rotation_translation(*size * 0.5, Quat::IDENTITY, *center),
                );
            }
            Shape::Curve { points, radius } => {
                // Joints get a sphere so consecutive segments close their seams.
                for point in points {
                    push(
                        MeshKind::Sphere,
                        Mat4::from_scale_rotation_translation(
                            Vec3::splat(*radius),
                            Quat::IDENTITY,
                            *point,
                        ),
                    );
                }
                for pair in points.windows(2) {
                    if let Some(transform) = along_axis(pair[0], pair[1] - pair[0], *radius) {
                        push(MeshKind::Cylinder, transform);
                    }
                }
            }
            Shape::Compound { parts, transform } => {
                let placed = parent * *transform;
                for part in parts {
                    part.emit(material, placed, out);
                }
            }
        }
    }
}

/// A shape with its material.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub shape: Shape,
    pub material: Material,
}

impl SceneObject {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self { shape, material }
    }

    pub fn emit(&self, out: &mut Vec<ShapeInstance>) {
        self.shape.emit(self.material, Mat4::IDENTITY, out);
    }
}

/// Rotation taking +Y onto `axis`.
fn rotation_to(axis: Vec3) -> Quat {
    match axis.try_normalize() {
        Some(direction) => Quat::from_rotation_arc(Vec3::Y, direction),
        None => Quat::IDENTITY,
    }
}

/// Transform of a unit Y-aligned mesh stretched from `base` along `axis`.
///
/// Degenerate axes produce nothing.
fn along_axis(base: Vec3, axis: Vec3, radius: f32) -> Option<Mat4> {
    let length = axis.length();
    if length <= f32::EPSILON {
        return None;
    }
    Some(Mat4::from_scale_rotation_translation(
        Vec3::new(radius, length, radius),
        Quat::from_rotation_arc(Vec3::Y, axis / length),
        base,
    ))
}
