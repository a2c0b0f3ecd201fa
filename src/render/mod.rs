//! GPU rendering modules
//!
//! Contains wgpu-based rendering infrastructure:
//! - Camera: Orbit camera controls
//! - Mesh: Unit primitive meshes shared by all instances
//! - Shape Renderer: Instanced opaque and translucent shape drawing
//! - Pipeline: Window surface, egui overlay and frame capture
//! - Headless: Offscreen rendering for batch export and automated testing

pub mod camera;
pub mod headless;
pub mod mesh;
pub mod pipeline;
pub mod shape_renderer;

pub use camera::Camera;
pub use headless::HeadlessRenderPipeline;
pub use pipeline::{RenderError, RenderPipeline};
pub use shape_renderer::ShapeRenderer;
