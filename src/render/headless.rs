//! Headless rendering pipeline for batch export and automated testing
//!
//! Provides GPU rendering without requiring a window or display,
//! enabling frame-sequence export, integration tests and screenshot
//! comparison tests.

use crate::config::SceneParameters;
use crate::export::image_export::{padded_bytes_per_row, unpad_rows};
use crate::render::camera::Camera;
use crate::render::shape_renderer::{ShapeRenderer, clear_color, create_depth_view};
use crate::scene::{Lighting, ShapeInstance};

/// Headless render pipeline for testing without a window
///
/// Renders to an offscreen texture and can extract pixel data for
/// verification, comparison or export.
pub struct HeadlessRenderPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    render_texture: wgpu::Texture,
    render_texture_view: wgpu::TextureView,
    depth_texture_view: wgpu::TextureView,
    shapes: ShapeRenderer,
    width: u32,
    height: u32,
    pub camera: Camera,
    pub lighting: Lighting,
    pub background: [f32; 3],
}

impl HeadlessRenderPipeline {
    /// Create a new headless render pipeline
    ///
    /// Returns `None` if no adapter or device is available.
    pub async fn new(width: u32, height: u32) -> Option<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // No surface requirement (headless)
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: Some("Headless Device"),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .ok()?;

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let render_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Headless Render Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_texture_view = create_depth_view(&device, width, height);

        let shapes = ShapeRenderer::new(&device, format);
        let scene = SceneParameters::default();

        Some(Self {
            device,
            queue,
            render_texture,
            render_texture_view,
            depth_texture_view,
            shapes,
            width,
            height,
            camera: Camera::from_scene(&scene, width as f32 / height.max(1) as f32),
            lighting: Lighting::default(),
            background: scene.background,
        })
    }

    /// Place the camera and background as the scene parameters describe.
    pub fn apply_scene(&mut self, scene: &SceneParameters) {
        self.camera = Camera::from_scene(scene, self.width as f32 / self.height.max(1) as f32);
        self.background = scene.background;
    }

    /// Render a frame to the offscreen texture
    pub fn render(&mut self, instances: &[ShapeInstance]) {
        self.shapes.prepare(
            &self.device,
            &self.queue,
            &self.camera,
            &self.lighting,
            instances,
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Headless Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Headless Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.render_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(self.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.shapes.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render a frame and return the pixel data as RGBA bytes
    ///
    /// Returns a Vec<u8> with length width * height * 4, or an empty vector
    /// if the readback failed.
    pub fn render_to_buffer(&mut self, instances: &[ShapeInstance]) -> Vec<u8> {
        self.render(instances);
        read_texture(
            &self.device,
            &self.queue,
            &self.render_texture,
            self.width,
            self.height,
        )
        .unwrap_or_default()
    }

    /// Get render dimensions
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Orbit the camera
    pub fn orbit_camera(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.orbit(delta_x, delta_y);
    }

    /// Zoom the camera
    pub fn zoom_camera(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    /// Triangles drawn by the last frame
    pub fn triangle_count(&self) -> usize {
        self.shapes.triangle_count()
    }
}

/// Copy a 4-byte-per-pixel texture into CPU memory, without row padding.
///
/// Returns `None` if the staging buffer could not be mapped.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Option<Vec<u8>> {
    let padded_bytes_per_row = padded_bytes_per_row(width);
    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging Buffer"),
        size: (padded_bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            log::warn!("Failed to map readback buffer: {}", error);
            return None;
        }
        Err(_) => return None,
    }

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        unpad_rows(&data, width, height, padded_bytes_per_row)
    };
    staging_buffer.unmap();
    Some(pixels)
}
