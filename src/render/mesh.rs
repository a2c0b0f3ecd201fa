//! Unit mesh generation for instanced shape rendering
//!
//! Every mesh is built once at unit size; instances scale and place it.
//! Cylinders and cones run along +Y from y = 0 to y = 1 so an axis-aligned
//! model matrix maps them onto any base point and axis.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::{PI, TAU};

use crate::scene::MeshKind;
use crate::scene::shapes::TORUS_TUBE_RATIO;

/// Vertex data for GPU rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// Position in mesh space
    pub position: [f32; 3],
    /// Surface normal (normalized, pointing outward)
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.normalize_or_zero().to_array(),
        }
    }

    /// Returns the vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Build the unit mesh for `kind`.
    pub fn for_kind(kind: MeshKind) -> Self {
        match kind {
            MeshKind::Sphere => Self::sphere(32, 16),
            MeshKind::Cylinder => Self::cylinder(40),
            MeshKind::Cone => Self::cone(32),
            MeshKind::Torus => Self::torus(48, 12, TORUS_TUBE_RATIO),
        }
    }

    /// Unit UV sphere (latitude/longitude grid).
    pub fn sphere(lon_segments: u32, lat_segments: u32) -> Self {
        let mut mesh = Self::default();

        for lat in 0..=lat_segments {
            let theta = (lat as f32 / lat_segments as f32) * PI;
            let (sin_theta, cos_theta) = theta.sin_cos();

            for lon in 0..=lon_segments {
                let phi = (lon as f32 / lon_segments as f32) * TAU;
                let (sin_phi, cos_phi) = phi.sin_cos();
                let point = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
                mesh.vertices.push(Vertex::new(point, point));
            }
        }

        for lat in 0..lat_segments {
            for lon in 0..lon_segments {
                let current = lat * (lon_segments + 1) + lon;
                let next = current + lon_segments + 1;

                // Skip degenerate triangles at the poles
                if lat != 0 {
                    mesh.indices.extend_from_slice(&[current, current + 1, next]);
                }
                if lat != lat_segments - 1 {
                    mesh.indices.extend_from_slice(&[current + 1, next + 1, next]);
                }
            }
        }

        mesh
    }

    /// Unit-radius cylinder from y = 0 to y = 1 with both caps.
    pub fn cylinder(segments: u32) -> Self {
        let mut mesh = Self::default();

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            let normal = Vec3::new(cos, 0.0, sin);
            mesh.vertices.push(Vertex::new(Vec3::new(cos, 0.0, sin), normal));
            mesh.vertices.push(Vertex::new(Vec3::new(cos, 1.0, sin), normal));
        }
        for i in 0..segments {
            let bottom = i * 2;
            let top = bottom + 1;
            let next_bottom = bottom + 2;
            let next_top = bottom + 3;
            mesh.indices
                .extend_from_slice(&[bottom, top, next_bottom, next_bottom, top, next_top]);
        }

        mesh.add_cap(segments, 0.0, -Vec3::Y);
        mesh.add_cap(segments, 1.0, Vec3::Y);
        mesh
    }

    /// Unit-radius cone with its base at y = 0 and apex at y = 1.
    pub fn cone(segments: u32) -> Self {
        let mut mesh = Self::default();
        // Slant normal of a cone with radius 1 and height 1
        let slope = 1.0 / 2.0_f32.sqrt();

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            let normal = Vec3::new(cos * slope, slope, sin * slope);
            mesh.vertices.push(Vertex::new(Vec3::new(cos, 0.0, sin), normal));
            mesh.vertices.push(Vertex::new(Vec3::Y, normal));
        }
        for i in 0..segments {
            let base = i * 2;
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        mesh.add_cap(segments, 0.0, -Vec3::Y);
        mesh
    }

    /// Torus around the Y axis with major radius 1 and tube radius `tube`.
    pub fn torus(major_segments: u32, minor_segments: u32, tube: f32) -> Self {
        let mut mesh = Self::default();

        for i in 0..=major_segments {
            let u = i as f32 / major_segments as f32 * TAU;
            let (sin_u, cos_u) = u.sin_cos();
            let ring_center = Vec3::new(cos_u, 0.0, sin_u);

            for j in 0..=minor_segments {
                let v = j as f32 / minor_segments as f32 * TAU;
                let (sin_v, cos_v) = v.sin_cos();
                let normal = ring_center * cos_v + Vec3::Y * sin_v;
                mesh.vertices
                    .push(Vertex::new(ring_center + normal * tube, normal));
            }
        }

        let stride = minor_segments + 1;
        for i in 0..major_segments {
            for j in 0..minor_segments {
                let a = i * stride + j;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
            }
        }

        mesh
    }

    /// Flat disc at height `y` facing `normal`.
    fn add_cap(&mut self, segments: u32, y: f32, normal: Vec3) {
        let center = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(Vec3::new(0.0, y, 0.0), normal));
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            self.vertices.push(Vertex::new(Vec3::new(cos, y, sin), normal));
        }
        for i in 0..segments {
            let rim = center + 1 + i;
            if normal.y > 0.0 {
                self.indices.extend_from_slice(&[center, rim + 1, rim]);
            } else {
                self.indices.extend_from_slice(&[center, rim, rim + 1]);
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
