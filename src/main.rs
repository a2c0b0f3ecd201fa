//! Bottle Fill Animation
//!
//! A cute bottle filling with liquid, with bubbles, hearts, droplets and a blinking face.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use bottle_fill::config::AnimationConfig;
use bottle_fill::export::image_export::{ensure_dir, export_frame, frame_path};
use bottle_fill::physics::{Command, Simulation};
use bottle_fill::render::{HeadlessRenderPipeline, RenderPipeline};
use bottle_fill::scene::{BottleScene, ShapeInstance};
use bottle_fill::timing::{FrameClock, FrameTick};

/// Real-time 3D bottle filling animation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override fill speed (height units per second)
    #[arg(long)]
    fill_speed: Option<f32>,

    /// Seed for reproducible spawn positions
    #[arg(long)]
    seed: Option<u64>,

    /// Override viewport width (pixels)
    #[arg(long)]
    width: Option<u32>,

    /// Override viewport height (pixels)
    #[arg(long)]
    height: Option<u32>,

    /// Start with the animation paused
    #[arg(long)]
    paused: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Render this many frames offscreen instead of opening a window
    #[arg(long)]
    headless_frames: Option<u32>,

    /// Output directory for headless frames
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,
}

/// Application state
struct App {
    window: Option<Arc<Window>>,
    pipeline: Option<RenderPipeline>,
    simulation: Simulation,
    scene: BottleScene,
    clock: FrameClock,
    instances: Vec<ShapeInstance>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(simulation: Simulation) -> Self {
        let scene = BottleScene::for_simulation(&simulation);
        let clock = FrameClock::new(simulation.config().scene.frame_rate, Instant::now());
        Self {
            window: None,
            pipeline: None,
            simulation,
            scene,
            clock,
            instances: Vec::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let scene = &self.simulation.config().scene;
        let window_attributes = Window::default_attributes()
            .with_title(scene.title.clone())
            .with_inner_size(LogicalSize::new(scene.width, scene.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        let mut pipeline = pollster::block_on(RenderPipeline::new(
            window.clone(),
            self.simulation.config(),
            self.simulation.handle(),
        ))
        .context("failed to initialise renderer")?;
        pipeline.lighting = self.scene.lighting().clone();

        self.window = Some(window);
        self.pipeline = Some(pipeline);
        self.clock = FrameClock::new(self.simulation.config().scene.frame_rate, Instant::now());
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(pipeline), Some(window)) = (&mut self.pipeline, &self.window) else {
            return;
        };

        let tick = self.clock.tick(Instant::now());
        self.simulation.step(tick);
        pipeline.update(tick.dt);

        self.instances.clear();
        self.scene.collect(&self.simulation, &mut self.instances);

        match pipeline.render(window, &self.simulation, &self.instances) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                pipeline.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_window(event_loop) {
            Ok(()) => log::info!("Window created, rendering started"),
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        // First, let egui handle the event
        let egui_consumed =
            if let (Some(pipeline), Some(window)) = (&mut self.pipeline, &self.window) {
                pipeline.handle_event(window, &event)
            } else {
                false
            };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(ref mut pipeline) = self.pipeline {
                    pipeline.resize(new_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } if !egui_consumed => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } if !egui_consumed => {
                if self.mouse_pressed
                    && let Some((last_x, last_y)) = self.last_mouse_pos
                    && let Some(ref mut pipeline) = self.pipeline
                {
                    pipeline
                        .camera
                        .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                }
                self.last_mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.last_mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(ref mut pipeline) = self.pipeline {
                    pipeline.camera.zoom(scroll);
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                let handle = self.simulation.handle();
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Named(NamedKey::Space) => handle.toggle_pause(),
                    Key::Character(ref c) if c.eq_ignore_ascii_case("r") => handle.reset(),
                    Key::Named(NamedKey::F12) => {
                        if let Some(ref mut pipeline) = self.pipeline {
                            pipeline.request_screenshot();
                        }
                    }
                    Key::Named(NamedKey::F11) => {
                        if let Some(ref mut pipeline) = self.pipeline {
                            pipeline.toggle_recording();
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window
            && self.clock.is_due(Instant::now())
        {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.clock.next_frame()));
    }
}

/// Simulate `frames` frames at the fixed rate and write each one as a PNG.
fn run_headless(simulation: &mut Simulation, frames: u32, output: &Path) -> Result<()> {
    let scene_params = simulation.config().scene.clone();
    let mut renderer = pollster::block_on(HeadlessRenderPipeline::new(
        scene_params.width,
        scene_params.height,
    ))
    .context("no GPU adapter available for headless rendering")?;
    renderer.apply_scene(&scene_params);

    ensure_dir(output)?;
    let scene = BottleScene::for_simulation(simulation);
    renderer.lighting = scene.lighting().clone();
    let mut instances = Vec::new();

    log::info!(
        "Rendering {} frames at {}x{} to {}",
        frames,
        scene_params.width,
        scene_params.height,
        output.display()
    );

    for index in 0..frames {
        simulation.step(FrameTick::fixed(index, scene_params.frame_rate));
        instances.clear();
        scene.collect(simulation, &mut instances);

        let pixels = renderer.render_to_buffer(&instances);
        let path = frame_path(output, "frame", index);
        export_frame(&path, scene_params.width, scene_params.height, &pixels)
            .with_context(|| format!("failed to write frame {}", index))?;
        log::debug!("Saved {}", path.display());
    }

    log::info!(
        "Finished {} frames, final level {:.2}",
        frames,
        simulation.level()
    );
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = if let Some(ref path) = args.config {
        match AnimationConfig::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                AnimationConfig::default()
            }
        }
    } else {
        AnimationConfig::default()
    };

    if let Some(fill_speed) = args.fill_speed {
        config.fill.fill_speed = fill_speed;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(width) = args.width {
        config.scene.width = width.max(1);
    }
    if let Some(height) = args.height {
        config.scene.height = height.max(1);
    }

    config.validate().context("invalid configuration")?;

    if let Some(ref path) = args.write_config {
        config
            .to_file(path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        log::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    log::info!(
        "Starting animation: fill speed {}, capacity {}",
        config.fill.fill_speed,
        config.level_max()
    );

    let mut simulation = Simulation::new(config);
    if args.paused {
        simulation.apply(Command::Pause);
    }

    if let Some(frames) = args.headless_frames {
        return run_headless(&mut simulation, frames, &args.output);
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(simulation);
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
