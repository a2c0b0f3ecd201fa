//! Instanced renderer for scene shapes.
//!
//! Each frame the scene's [`ShapeInstance`]s are split into an opaque set,
//! grouped by mesh, and a translucent set sorted back to front. Both sets
//! are packed into one instance buffer and drawn with two pipelines that
//! differ only in blending and depth writes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};
use std::ops::Range;
use wgpu::util::DeviceExt;

use crate::render::camera::Camera;
use crate::render::mesh::{Mesh, Vertex};
use crate::scene::{Light, Lighting, MeshKind, ShapeInstance};

/// Lights beyond this count are ignored.
pub const MAX_LIGHTS: usize = 4;

/// Instance slots allocated up front; the buffer grows on demand.
const INITIAL_CAPACITY: usize = 256;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-instance data sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuInstance {
    /// Model matrix columns
    pub model: [[f32; 4]; 4],
    /// Normal matrix columns (xyz used)
    pub normal: [[f32; 4]; 3],
    /// Linear RGB plus opacity
    pub color: [f32; 4],
    /// x = shininess
    pub material: [f32; 4],
}

impl GpuInstance {
    pub fn from_shape(instance: &ShapeInstance) -> Self {
        let model = instance.transform;
        let linear = Mat3::from_mat4(model);
        // Inverse transpose keeps normals perpendicular under non-uniform scale.
        let normal = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };
        let [r, g, b] = instance.material.color.map(srgb_to_linear);

        // WGSL matrix constructors take columns
        Self {
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
            color: [r, g, b, instance.material.opacity],
            material: [instance.material.shininess, 0.0, 0.0, 0.0],
        }
    }

    /// Returns the vertex buffer layout for instance data.
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
            10 => Float32x4,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightUniform {
    /// w = 0 for a direction, w = 1 for a position
    pub position: [f32; 4],
    pub color: [f32; 4],
}

/// Lighting uniform matching the `Lights` struct in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
    /// x = active light count
    pub info: [u32; 4],
}

impl LightsUniform {
    pub fn from_lighting(lighting: &Lighting) -> Self {
        if lighting.lights.len() > MAX_LIGHTS {
            log::warn!(
                "Scene has {} lights, only the first {} are used",
                lighting.lights.len(),
                MAX_LIGHTS
            );
        }

        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        for (slot, light) in lights.iter_mut().zip(&lighting.lights) {
            *slot = match *light {
                Light::Distant { direction, color } => LightUniform {
                    position: direction.extend(0.0).to_array(),
                    color: [color[0], color[1], color[2], 1.0],
                },
                Light::Local { position, color } => LightUniform {
                    position: position.extend(1.0).to_array(),
                    color: [color[0], color[1], color[2], 1.0],
                },
            };
        }

        let [r, g, b] = lighting.ambient;
        Self {
            ambient: [r, g, b, 1.0],
            lights,
            info: [lighting.lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
        }
    }
}

/// A contiguous range of instances drawn with one mesh and pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub mesh: MeshKind,
    pub instances: Range<u32>,
    pub translucent: bool,
}

/// Order instances for drawing as seen from `eye`.
///
/// Opaque instances come first grouped by mesh; translucent ones follow,
/// farthest first, merged into batches only where neighbours share a mesh.
pub fn plan_draws(instances: &[ShapeInstance], eye: Vec3) -> (Vec<GpuInstance>, Vec<DrawBatch>) {
    let (mut opaque, mut translucent): (Vec<&ShapeInstance>, Vec<&ShapeInstance>) = instances
        .iter()
        .partition(|instance| !instance.material.is_translucent());

    opaque.sort_by_key(|instance| instance.mesh);
    translucent.sort_by(|a, b| {
        let da = eye.distance_squared(center_of(a));
        let db = eye.distance_squared(center_of(b));
        db.total_cmp(&da)
    });

    let mut gpu = Vec::with_capacity(instances.len());
    let mut batches: Vec<DrawBatch> = Vec::new();
    let ordered = opaque
        .into_iter()
        .map(|instance| (instance, false))
        .chain(translucent.into_iter().map(|instance| (instance, true)));

    for (instance, translucent) in ordered {
        let index = gpu.len() as u32;
        gpu.push(GpuInstance::from_shape(instance));

        match batches.last_mut() {
            Some(batch) if batch.mesh == instance.mesh && batch.translucent == translucent => {
                batch.instances.end = index + 1;
            }
            _ => batches.push(DrawBatch {
                mesh: instance.mesh,
                instances: index..index + 1,
                translucent,
            }),
        }
    }

    (gpu, batches)
}

/// World-space center of an instance's unit mesh.
fn center_of(instance: &ShapeInstance) -> Vec3 {
    let local = match instance.mesh {
        MeshKind::Cylinder | MeshKind::Cone => Vec3::new(0.0, 0.5, 0.0),
        MeshKind::Sphere | MeshKind::Torus => Vec3::ZERO,
    };
    instance.transform.transform_point3(local)
}

fn srgb_to_linear(channel: f32) -> f32 {
    channel.clamp(0.0, 1.0).powf(2.2)
}

/// Clear color for a background given in display (sRGB) space.
pub fn clear_color(background: [f32; 3]) -> wgpu::Color {
    let [r, g, b] = background.map(srgb_to_linear);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

/// Depth buffer view matching the renderer's depth format.
pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Draws scene shapes with GPU instancing.
pub struct ShapeRenderer {
    meshes: Vec<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    batches: Vec<DrawBatch>,
    triangles: usize,
}

impl ShapeRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let meshes = MeshKind::ALL
            .iter()
            .map(|&kind| {
                let mesh = Mesh::for_kind(kind);
                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Shape Vertex Buffer"),
                        contents: mesh.vertex_bytes(),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Shape Index Buffer"),
                        contents: mesh.index_bytes(),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mesh.indices.len() as u32,
                }
            })
            .collect();

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[Camera::new(1.0).uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[LightsUniform::from_lighting(&Lighting::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(0), uniform_entry(1)],
            label: Some("shape_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
            label: Some("shape_bind_group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shape Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shape.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shape Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            "Opaque Shape Pipeline",
            wgpu::BlendState::REPLACE,
            true,
        );
        let translucent_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            "Translucent Shape Pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );

        Self {
            meshes,
            instance_buffer: Self::create_instance_buffer(device, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            camera_buffer,
            lights_buffer,
            bind_group,
            opaque_pipeline,
            translucent_pipeline,
            batches: Vec::new(),
            triangles: 0,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        label: &str,
        blend: wgpu::BlendState,
        depth_write_enabled: bool,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::buffer_layout(), GpuInstance::buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Glass is seen from both sides
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shape Instance Buffer"),
            size: (capacity * std::mem::size_of::<GpuInstance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Upload camera, lights and this frame's instances.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        lighting: &Lighting,
        instances: &[ShapeInstance],
    ) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera.uniform()]));
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::cast_slice(&[LightsUniform::from_lighting(lighting)]),
        );

        let (gpu, batches) = plan_draws(instances, camera.position());
        if gpu.len() > self.capacity {
            self.capacity = gpu.len().next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.capacity);
            log::debug!("Grew shape instance buffer to {} slots", self.capacity);
        }
        if !gpu.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&gpu));
        }

        self.triangles = batches
            .iter()
            .map(|batch| {
                let mesh = &self.meshes[batch.mesh.index()];
                (mesh.index_count / 3) as usize * batch.instances.len()
            })
            .sum();
        self.batches = batches;
    }

    /// Record the draws planned by the last [`ShapeRenderer::prepare`].
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.batches.is_empty() {
            return;
        }

        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        let mut translucent = None;
        for batch in &self.batches {
            if translucent != Some(batch.translucent) {
                pass.set_pipeline(if batch.translucent {
                    &self.translucent_pipeline
                } else {
                    &self.opaque_pipeline
                });
                translucent = Some(batch.translucent);
            }

            let mesh = &self.meshes[batch.mesh.index()];
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
        }
    }

    /// Triangles submitted by the planned draws.
    pub fn triangle_count(&self) -> usize {
        self.triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Shape};
    use glam::Mat4;

    fn sphere(center: Vec3, material: Material) -> ShapeInstance {
        let mut out = Vec::new();
        Shape::Sphere { center, radius: 1.0 }.emit(material, Mat4::IDENTITY, &mut out);
        out[0]
    }

    #[test]
    fn test_instance_size() {
        // 4 model columns + 3 normal columns + color + material
        assert_eq!(std::mem::size_of::<GpuInstance>(), 144);
    }

    #[test]
    fn test_lights_uniform_size() {
        assert_eq!(std::mem::size_of::<LightsUniform>(), 16 + 32 * MAX_LIGHTS + 16);
    }

    #[test]
    fn test_lights_uniform_encodes_kinds() {
        let uniform = LightsUniform::from_lighting(&Lighting::default());
        assert_eq!(uniform.info[0], 3);
        assert_eq!(uniform.lights[0].position[3], 0.0);
        assert_eq!(uniform.lights[1].position, [6.0, 12.0, 8.0, 1.0]);
        assert_eq!(uniform.lights[3].color, [0.0; 4]);
    }

    #[test]
    fn test_model_matrix_translation() {
        let instance = sphere(Vec3::new(1.0, 2.0, 3.0), Material::default());
        let gpu = GpuInstance::from_shape(&instance);
        assert_eq!(gpu.model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_normal_matrix_undoes_scale() {
        let mut out = Vec::new();
        Shape::Ellipsoid {
            center: Vec3::ZERO,
            size: Vec3::new(2.0, 0.5, 2.0),
        }
        .emit(Material::default(), Mat4::IDENTITY, &mut out);
        let gpu = GpuInstance::from_shape(&out[0]);
        // Half extents (1, 0.25, 1) invert to (1, 4, 1)
        assert!((gpu.normal[1][1] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_opaque_before_translucent() {
        let glass = Material::translucent([1.0, 1.0, 1.0], 0.5);
        let solid = Material::opaque([0.0, 0.0, 0.0]);
        let instances = vec![
            sphere(Vec3::ZERO, glass),
            sphere(Vec3::X, solid),
            sphere(Vec3::Y, solid),
        ];
        let (gpu, batches) = plan_draws(&instances, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(gpu.len(), 3);
        assert_eq!(
            batches,
            vec![
                DrawBatch {
                    mesh: MeshKind::Sphere,
                    instances: 0..2,
                    translucent: false,
                },
                DrawBatch {
                    mesh: MeshKind::Sphere,
                    instances: 2..3,
                    translucent: true,
                },
            ]
        );
    }

    #[test]
    fn test_translucent_back_to_front() {
        let glass = Material::translucent([1.0, 1.0, 1.0], 0.5);
        let instances = vec![
            sphere(Vec3::new(0.0, 0.0, 5.0), glass),
            sphere(Vec3::new(0.0, 0.0, -5.0), glass),
            sphere(Vec3::ZERO, glass),
        ];
        let (gpu, _) = plan_draws(&instances, Vec3::new(0.0, 0.0, 10.0));
        let depths: Vec<f32> = gpu.iter().map(|g| g.model[3][2]).collect();
        assert_eq!(depths, vec![-5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_mixed_meshes_split_batches() {
        let glass = Material::translucent([1.0, 1.0, 1.0], 0.5);
        let mut instances = Vec::new();
        Shape::Cylinder {
            base: Vec3::new(0.0, 0.0, -2.0),
            axis: Vec3::Y,
            radius: 1.0,
        }
        .emit(glass, Mat4::IDENTITY, &mut instances);
        instances.push(sphere(Vec3::new(0.0, 0.0, -1.0), glass));
        instances.push(sphere(Vec3::new(0.0, 0.0, -3.0), glass));

        let (_, batches) = plan_draws(&instances, Vec3::new(0.0, 0.0, 10.0));
        let meshes: Vec<MeshKind> = batches.iter().map(|b| b.mesh).collect();
        assert_eq!(
            meshes,
            vec![MeshKind::Sphere, MeshKind::Cylinder, MeshKind::Sphere]
        );
    }

    #[test]
    fn test_material_color_is_converted_from_srgb() {
        let liquid = Material::translucent([0.5, 1.0, 0.0], 0.75);
        let gpu = GpuInstance::from_shape(&sphere(Vec3::ZERO, liquid));
        assert!((gpu.color[0] - 0.5_f32.powf(2.2)).abs() < 1e-6);
        assert!((gpu.color[1] - 1.0).abs() < 1e-6);
        assert_eq!(gpu.color[2], 0.0);
        assert!((gpu.color[3] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_clear_color_white() {
        let color = clear_color([1.0, 1.0, 1.0]);
        assert!((color.r - 1.0).abs() < 1e-6);
        assert!((color.a - 1.0).abs() < 1e-6);
    }
}
