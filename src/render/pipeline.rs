//! Windowed render pipeline: surface, shape renderer and egui overlay

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AnimationConfig;
use crate::export::image_export::{self, CaptureCounters, ensure_dir, swap_red_blue};
use crate::physics::{BlinkState, Simulation, SimulationHandle};
use crate::render::camera::Camera;
use crate::render::headless::read_texture;
use crate::render::shape_renderer::{DEPTH_FORMAT, ShapeRenderer, clear_color, create_depth_view};
use crate::scene::{Lighting, ShapeInstance};

/// Frames averaged for the FPS readout
const FPS_WINDOW: usize = 60;

/// Directory screenshots and recordings are written to
const CAPTURE_DIR: &str = "screenshots";

/// Errors raised while setting up the GPU
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create window surface")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to request GPU device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}

/// Read-only values shown in the overlay
struct OverlayStatus {
    fill_fraction: f32,
    level: f32,
    level_max: f32,
    paused: bool,
    blink: BlinkState,
    time: f32,
    entities: (usize, usize, usize),
    camera_distance: f32,
    camera_yaw: f32,
    camera_pitch: f32,
    fps: f32,
    width: u32,
    height: u32,
    triangles: usize,
    recording: bool,
    frame_counter: u32,
    can_capture: bool,
}

/// What the user clicked this frame
#[derive(Default)]
struct OverlayActions {
    toggle_pause: bool,
    reset: bool,
    screenshot: bool,
    toggle_recording: bool,
}

/// Main render pipeline for the bottle window
pub struct RenderPipeline {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    shapes: ShapeRenderer,
    pub camera: Camera,
    pub lighting: Lighting,
    background: [f32; 3],
    handle: SimulationHandle,
    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    // FPS tracking
    frame_times: VecDeque<f32>,
    fps: f32,
    // Export state
    can_capture: bool,
    capture_dir: PathBuf,
    pub recording: bool,
    counters: CaptureCounters,
    pub screenshot_requested: bool,
}

impl RenderPipeline {
    /// Create a new render pipeline for `window`
    pub async fn new(
        window: Arc<winit::window::Window>,
        animation: &AnimationConfig,
        handle: SimulationHandle,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;

        let can_capture = surface_caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        if !can_capture {
            log::warn!("Surface does not support readback; screenshots are disabled");
        }
        let usage = if can_capture {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        };

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_view(&device, config.width, config.height);
        let shapes = ShapeRenderer::new(&device, surface_format);
        let camera = Camera::from_scene(
            &animation.scene,
            config.width as f32 / config.height as f32,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&device, surface_format, Some(DEPTH_FORMAT), 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            shapes,
            camera,
            lighting: Lighting::default(),
            background: animation.scene.background,
            handle,
            egui_ctx,
            egui_state,
            egui_renderer,
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
            fps: 0.0,
            can_capture,
            capture_dir: PathBuf::from(CAPTURE_DIR),
            recording: false,
            counters: CaptureCounters::default(),
            screenshot_requested: false,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_view(&self.device, new_size.width, new_size.height);
            self.camera
                .set_aspect(new_size.width as f32 / new_size.height as f32);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Handle window events for egui
    ///
    /// Returns `true` when egui consumed the event.
    pub fn handle_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// Track frame timing for the FPS readout
    pub fn update(&mut self, dt: f32) {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > FPS_WINDOW {
            self.frame_times.pop_front();
        }
        let total: f32 = self.frame_times.iter().sum();
        if total > 0.0 {
            self.fps = self.frame_times.len() as f32 / total;
        }
    }

    /// Render a frame with egui overlay
    pub fn render(
        &mut self,
        window: &winit::window::Window,
        simulation: &Simulation,
        instances: &[ShapeInstance],
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.shapes.prepare(
            &self.device,
            &self.queue,
            &self.camera,
            &self.lighting,
            instances,
        );

        let status = OverlayStatus {
            fill_fraction: simulation.fill().fraction(),
            level: simulation.level(),
            level_max: simulation.fill().level_max(),
            paused: simulation.is_paused(),
            blink: simulation.blink_state(),
            time: simulation.time(),
            entities: (
                simulation.bubbles().len(),
                simulation.hearts().len(),
                simulation.droplets().len(),
            ),
            camera_distance: self.camera.distance,
            camera_yaw: self.camera.yaw,
            camera_pitch: self.camera.pitch,
            fps: self.fps,
            width: self.config.width,
            height: self.config.height,
            triangles: self.shapes.triangle_count(),
            recording: self.recording,
            frame_counter: self.counters.frames,
            can_capture: self.can_capture,
        };
        let mut actions = OverlayActions::default();

        let raw_input = self.egui_state.take_egui_input(window);
        let egui_output = self.egui_ctx.run(raw_input, |ctx| {
            Self::build_ui(ctx, &status, &mut actions);
        });
        self.apply_actions(actions);

        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let clipped_primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: egui_output.pixels_per_point,
        };
        for (id, image_delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let egui_commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        // Scene
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(self.background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
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

        // Overlay
        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_texture,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(
            egui_commands
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );

        if self.can_capture && (self.screenshot_requested || self.recording) {
            self.capture(&output.texture);
        }
        self.screenshot_requested = false;

        output.present();

        Ok(())
    }

    fn apply_actions(&mut self, actions: OverlayActions) {
        if actions.toggle_pause {
            self.handle.toggle_pause();
        }
        if actions.reset {
            self.handle.reset();
        }
        if actions.screenshot {
            self.request_screenshot();
        }
        if actions.toggle_recording {
            self.toggle_recording();
        }
    }

    /// Save the presented frame as a recording frame and/or screenshot
    fn capture(&mut self, texture: &wgpu::Texture) {
        let (width, height) = (self.config.width, self.config.height);
        let Some(mut pixels) = read_texture(&self.device, &self.queue, texture, width, height)
        else {
            log::error!("Failed to read back frame for export");
            return;
        };

        if matches!(
            self.config.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            swap_red_blue(&mut pixels);
        }

        if let Err(e) = ensure_dir(&self.capture_dir) {
            log::error!("Failed to export frame: {}", e);
            return;
        }

        let paths = self.counters.next_paths(
            &self.capture_dir,
            self.recording,
            self.screenshot_requested,
        );
        for path in paths {
            match image_export::export_frame(&path, width, height, &pixels) {
                Ok(()) => log::info!("Saved: {}", path.display()),
                Err(e) => log::error!("Failed to export frame: {}", e),
            }
        }
    }

    /// Build the egui status window
    fn build_ui(ctx: &egui::Context, status: &OverlayStatus, actions: &mut OverlayActions) {
        egui::Window::new("Bottle")
            .default_pos([10.0, 10.0])
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Fill");
                ui.separator();

                ui.add(
                    egui::ProgressBar::new(status.fill_fraction)
                        .text(format!("{:.0}%", status.fill_fraction * 100.0)),
                );
                ui.label(format!(
                    "Level {:.2} / {:.2}",
                    status.level, status.level_max
                ));

                ui.horizontal(|ui| {
                    let play_text = if status.paused {
                        "\u{25B6} Resume"
                    } else {
                        "\u{23F8} Pause"
                    };
                    if ui.button(play_text).clicked() {
                        actions.toggle_pause = true;
                    }
                    if ui.button("\u{27F2} Reset").clicked() {
                        actions.reset = true;
                    }
                });

                ui.separator();
                ui.collapsing("Status", |ui| {
                    egui::Grid::new("status_grid")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            ui.label("State:");
                            ui.label(if status.paused { "Paused" } else { "Filling" });
                            ui.end_row();

                            ui.label("Eyes:");
                            ui.label(match status.blink {
                                BlinkState::Open => "Open",
                                BlinkState::Blinking => "Blinking",
                            });
                            ui.end_row();

                            let (bubbles, hearts, droplets) = status.entities;
                            ui.label("Bubbles:");
                            ui.label(format!("{}", bubbles));
                            ui.end_row();

                            ui.label("Hearts:");
                            ui.label(format!("{}", hearts));
                            ui.end_row();

                            ui.label("Droplets:");
                            ui.label(format!("{}", droplets));
                            ui.end_row();

                            ui.label("Time:");
                            ui.label(format!("{:.1} s", status.time));
                            ui.end_row();
                        });
                });

                ui.collapsing("Camera Info", |ui| {
                    egui::Grid::new("camera_grid")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            ui.label("Distance:");
                            ui.label(format!("{:.1}", status.camera_distance));
                            ui.end_row();

                            ui.label("Yaw:");
                            ui.label(format!("{:.1}°", status.camera_yaw.to_degrees()));
                            ui.end_row();

                            ui.label("Pitch:");
                            ui.label(format!("{:.1}°", status.camera_pitch.to_degrees()));
                            ui.end_row();
                        });
                });

                ui.collapsing("Performance", |ui| {
                    egui::Grid::new("perf_grid")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            ui.label("FPS:");
                            ui.label(format!("{:.0}", status.fps));
                            ui.end_row();

                            ui.label("Resolution:");
                            ui.label(format!("{}x{}", status.width, status.height));
                            ui.end_row();

                            ui.label("Triangles:");
                            ui.label(format!("{}", status.triangles));
                            ui.end_row();
                        });
                });

                ui.separator();
                ui.heading("Export");
                ui.separator();

                ui.add_enabled_ui(status.can_capture, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("\u{1F4F7} Screenshot").clicked() {
                            actions.screenshot = true;
                        }

                        let record_text = if status.recording {
                            "\u{23F9} Stop Recording"
                        } else {
                            "\u{23FA} Record"
                        };
                        if ui.button(record_text).clicked() {
                            actions.toggle_recording = true;
                        }
                    });
                });

                if status.recording {
                    ui.colored_label(
                        egui::Color32::RED,
                        format!("\u{1F534} Recording... Frame {}", status.frame_counter),
                    );
                }

                ui.small("F12: Screenshot | F11: Toggle Recording");

                ui.separator();
                ui.small("Space: pause | R: reset | Drag: rotate | Scroll: zoom | Esc: exit");
            });
    }

    /// Request a screenshot on the next frame
    pub fn request_screenshot(&mut self) {
        self.screenshot_requested = true;
    }

    /// Toggle recording mode
    pub fn toggle_recording(&mut self) {
        self.recording = !self.recording;
        if self.recording {
            self.counters.frames = 0;
            log::info!("Recording started");
        } else {
            log::info!("Recording stopped after {} frames", self.counters.frames);
        }
    }

    /// Get window size
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
