//! Bottle Fill Animation Library
//!
//! Real-time 3D animation of a cute bottle filling with liquid, with:
//! - A saturating fill level across body and neck
//! - Rising bubbles and hearts, falling droplets and a surface wave ring
//! - A blinking face
//! - GPU-instanced rendering, windowed or headless

pub mod config;
pub mod export;
pub mod physics;
pub mod render;
pub mod scene;
pub mod timing;

pub use config::AnimationConfig;
