//! Export modules
//!
//! Handles frame export:
//! - Image: PNG export of screenshots, recordings and headless renders

pub mod image_export;

pub use image_export::{ExportError, export_frame};
