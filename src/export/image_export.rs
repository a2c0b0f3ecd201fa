//! PNG export of rendered frames

use std::path::{Path, PathBuf};

/// Errors that can occur during export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Zero-sized image
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel data does not match the dimensions
    #[error("data length {actual} doesn't match expected {expected} ({width}x{height}x4)")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Output directory could not be created
    #[error("failed to create output directory '{}'", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or writing the PNG failed
    #[error("failed to save image '{}'", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Row pitch of a texture copy, padded to wgpu's alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Strip the per-row padding of a texture readback.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let row_bytes = (width * 4) as usize;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data
        .chunks(padded_bytes_per_row as usize)
        .take(height as usize)
    {
        pixels.extend_from_slice(&row[..row_bytes.min(row.len())]);
    }
    pixels
}

/// Swap the red and blue channels in place (BGRA <-> RGBA).
pub fn swap_red_blue(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }
}

/// Path of frame `index` with the given prefix inside `dir`.
pub fn frame_path<P: AsRef<Path>>(dir: P, prefix: &str, index: u32) -> PathBuf {
    dir.as_ref().join(format!("{}_{:04}.png", prefix, index))
}

/// Numbering of interactive captures.
#[derive(Debug, Clone, Default)]
pub struct CaptureCounters {
    /// Frames written since recording started
    pub frames: u32,
    /// Screenshots written this session
    pub screenshots: u32,
}

impl CaptureCounters {
    /// Files one presented frame is written to.
    ///
    /// A recording frame comes first; a requested screenshot is always
    /// written under its own name, also while recording.
    pub fn next_paths(&mut self, dir: &Path, recording: bool, screenshot: bool) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if recording {
            paths.push(frame_path(dir, "frame", self.frames));
            self.frames += 1;
        }
        if screenshot {
            paths.push(frame_path(dir, "screenshot", self.screenshots));
            self.screenshots += 1;
        }
        paths
    }
}

/// Create `dir` (and parents) if it does not exist.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<(), ExportError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Export raw RGBA pixel data to a PNG file
///
/// # Arguments
/// * `path` - Output file path
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `data` - RGBA u8 pixel data (length must be width * height * 4)
pub fn export_frame<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<(), ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 4;
    if data.len() != expected {
        return Err(ExportError::SizeMismatch {
            width,
            height,
            expected,
            actual: data.len(),
        });
    }

    let path = path.as_ref();
    image::save_buffer(path, data, width, height, image::ColorType::Rgba8).map_err(|source| {
        ExportError::Save {
            path: path.to_path_buf(),
            source,
        }
    })
}
