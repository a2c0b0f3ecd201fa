//! Configuration module for the bottle fill animation.
//!
//! This module defines the parameter groups for the animation: viewport and
//! camera, bottle dimensions, fill rate, and the tuning constants of every
//! animated decoration (bubbles, hearts, droplets, wave ring, face, blink).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Viewport, background and camera placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParameters {
    /// Window title
    pub title: String,

    /// Viewport width in pixels
    pub width: u32,

    /// Viewport height in pixels
    pub height: u32,

    /// Background color (sRGB)
    pub background: [f32; 3],

    /// Point the camera looks at
    pub center: [f32; 3],

    /// Viewing direction (does not need to be normalized)
    pub forward: [f32; 3],

    /// Distance from the camera to `center`
    pub camera_distance: f32,

    /// Target frame rate of the animation loop (Hz)
    pub frame_rate: f64,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            title: "Cute 3D Bottle Filling Animation \u{1F4A7}".to_string(),
            width: 1000,
            height: 700,
            background: [1.0, 1.0, 1.0],
            center: [0.0, 7.0, 0.0],
            forward: [0.2, -0.25, -1.0],
            camera_distance: 30.0,
            frame_rate: 60.0,
        }
    }
}

/// Bottle dimensions in scene units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleParameters {
    /// Height of the tapered body
    pub body_height: f32,

    /// Height of the neck above the body
    pub neck_height: f32,

    /// Outer radius of the lower body segment
    pub radius_bottom: f32,

    /// Outer radius of the middle body segment
    pub radius_mid: f32,

    /// Outer radius of the upper body segment
    pub radius_top: f32,

    /// Outer radius of the neck
    pub radius_neck: f32,

    /// Glass wall thickness
    pub wall: f32,

    /// Glass tint (sRGB)
    pub glass_color: [f32; 3],

    /// Glass opacity
    pub glass_opacity: f32,

    /// Liquid tint (sRGB)
    pub liquid_color: [f32; 3],

    /// Liquid opacity
    pub liquid_opacity: f32,
}

impl Default for BottleParameters {
    fn default() -> Self {
        Self {
            body_height: 12.0,
            neck_height: 3.0,
            radius_bottom: 2.9,
            radius_mid: 2.6,
            radius_top: 2.2,
            radius_neck: 0.8,
            wall: 0.12,
            glass_color: [0.7, 0.9, 1.0],
            glass_opacity: 0.18,
            liquid_color: [0.65, 0.85, 1.0],
            liquid_opacity: 0.75,
        }
    }
}

/// Fill progression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillParameters {
    /// Liquid height gained per second
    pub fill_speed: f32,
}

impl Default for FillParameters {
    fn default() -> Self {
        Self { fill_speed: 0.9 }
    }
}

/// Rising bubbles inside the liquid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleParameters {
    /// Number of bubbles
    pub count: usize,

    /// Smallest bubble radius
    pub radius_min: f32,

    /// Largest bubble radius
    pub radius_max: f32,

    /// Base rise rate; effective speed scales with `1 / radius`
    pub rise_rate: f32,

    /// Amplitude of the per-frame horizontal drift
    pub drift: f32,
}

impl Default for BubbleParameters {
    fn default() -> Self {
        Self {
            count: 20,
            radius_min: 0.05,
            radius_max: 0.09,
            rise_rate: 0.35,
            drift: 0.002,
        }
    }
}

/// Floating heart decorations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartParameters {
    /// Number of hearts
    pub count: usize,

    /// Smallest heart scale
    pub scale_min: f32,

    /// Largest heart scale
    pub scale_max: f32,

    /// Vertical speed (units per second)
    pub rise_speed: f32,

    /// Rotation about the vertical axis (radians per second)
    pub yaw_rate: f32,

    /// Rotation about the horizontal X axis (radians per second)
    pub tilt_rate: f32,

    /// Palette hearts pick their color from
    pub colors: Vec<[f32; 3]>,
}

impl Default for HeartParameters {
    fn default() -> Self {
        Self {
            count: 8,
            scale_min: 0.17,
            scale_max: 0.28,
            rise_speed: 0.15,
            yaw_rate: 0.5,
            tilt_rate: 0.2,
            colors: vec![
                [1.0, 0.6, 0.8],
                [1.0, 0.7, 0.75],
                [1.0, 0.55, 0.7],
                [0.95, 0.7, 0.9],
            ],
        }
    }
}

/// Droplets pouring from the spout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropletParameters {
    /// Number of droplets
    pub count: usize,

    /// Droplet sphere radius
    pub radius: f32,

    /// Vertical acceleration (negative is down)
    pub gravity: f32,

    /// Vertical spacing of the initial droplet column
    pub spacing: f32,

    /// Horizontal jitter applied when a droplet returns to the spout
    pub jitter: f32,

    /// Amplitude of the per-frame horizontal wiggle
    pub wiggle: f32,
}

impl Default for DropletParameters {
    fn default() -> Self {
        Self {
            count: 12,
            radius: 0.09,
            gravity: -4.0,
            spacing: 0.15,
            jitter: 0.02,
            wiggle: 0.002,
        }
    }
}

/// Ripple markers on the liquid surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParameters {
    /// Number of markers around the ring
    pub count: usize,

    /// Vertical bob amplitude in the body (halved in the neck)
    pub amplitude: f32,

    /// Marker sphere radius
    pub marker_radius: f32,
}

impl Default for WaveParameters {
    fn default() -> Self {
        Self {
            count: 22,
            amplitude: 0.07,
            marker_radius: 0.06,
        }
    }
}

/// Placement of the cartoon face on the bottle front.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceParameters {
    /// Horizontal distance between the eye centers
    pub eye_separation: f32,

    /// Height of the eye centers
    pub eye_height: f32,

    /// Eye width (and fully open height)
    pub eye_size: f32,

    /// Height of the smile baseline
    pub smile_height: f32,

    /// Smile arc radius
    pub smile_radius: f32,
}

impl Default for FaceParameters {
    fn default() -> Self {
        Self {
            eye_separation: 1.8,
            eye_height: 5.5,
            eye_size: 0.45,
            smile_height: 4.4,
            smile_radius: 1.1,
        }
    }
}

/// Eye blink timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkParameters {
    /// Idle time between blinks (seconds)
    pub interval: f32,

    /// Squash amount; divided by the frame delta each frame
    pub squash_rate: f32,

    /// Lowest vertical eye scale
    pub min_scale: f32,

    /// Scale at or below which the eyes reopen
    pub reopen_threshold: f32,

    /// Fully open vertical eye scale
    pub open_scale: f32,
}

impl Default for BlinkParameters {
    fn default() -> Self {
        Self {
            interval: 2.6,
            squash_rate: 0.009,
            min_scale: 0.06,
            reopen_threshold: 0.07,
            open_scale: 0.45,
        }
    }
}

/// Complete animation configuration combining all parameter groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Viewport, background and camera
    #[serde(default)]
    pub scene: SceneParameters,

    /// Bottle dimensions and materials
    #[serde(default)]
    pub bottle: BottleParameters,

    /// Fill progression
    #[serde(default)]
    pub fill: FillParameters,

    /// Rising bubbles
    #[serde(default)]
    pub bubbles: BubbleParameters,

    /// Floating hearts
    #[serde(default)]
    pub hearts: HeartParameters,

    /// Pouring droplets
    #[serde(default)]
    pub droplets: DropletParameters,

    /// Surface ripple ring
    #[serde(default)]
    pub waves: WaveParameters,

    /// Face placement
    #[serde(default)]
    pub face: FaceParameters,

    /// Blink timing
    #[serde(default)]
    pub blink: BlinkParameters,

    /// Seed for the random spawn positions; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AnimationConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing groups and fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters that would break the fill or blink invariants.
    ///
    /// The level must never decrease and the eye scale must stay between
    /// the squash floor and the open scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bottle = &self.bottle;
        if !is_positive(bottle.body_height.into()) {
            return Err(ConfigError::invalid(format!(
                "bottle.body_height must be positive, got {}",
                bottle.body_height
            )));
        }
        if !is_positive(bottle.neck_height.into()) {
            return Err(ConfigError::invalid(format!(
                "bottle.neck_height must be positive, got {}",
                bottle.neck_height
            )));
        }
        if self.fill.fill_speed.is_nan() || self.fill.fill_speed < 0.0 {
            return Err(ConfigError::invalid(format!(
                "fill.fill_speed must not be negative, got {}",
                self.fill.fill_speed
            )));
        }
        if !is_positive(self.scene.frame_rate) {
            return Err(ConfigError::invalid(format!(
                "scene.frame_rate must be positive, got {}",
                self.scene.frame_rate
            )));
        }

        let blink = &self.blink;
        if !is_positive(blink.squash_rate.into()) {
            return Err(ConfigError::invalid(format!(
                "blink.squash_rate must be positive, got {}",
                blink.squash_rate
            )));
        }
        if blink.min_scale > blink.reopen_threshold {
            return Err(ConfigError::invalid(format!(
                "blink.min_scale ({}) must not exceed blink.reopen_threshold ({})",
                blink.min_scale, blink.reopen_threshold
            )));
        }
        if blink.reopen_threshold >= blink.open_scale {
            return Err(ConfigError::invalid(format!(
                "blink.reopen_threshold ({}) must be below blink.open_scale ({})",
                blink.reopen_threshold, blink.open_scale
            )));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Highest reachable fill level (body plus neck).
    pub fn level_max(&self) -> f32 {
        self.bottle.body_height + self.bottle.neck_height
    }
}

/// Strictly above zero; NaN fails.
fn is_positive(value: f64) -> bool {
    value > 0.0
}

/// Error types for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error when reading or writing configuration files
    #[error("failed to read/write config file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse config file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("failed to serialize config")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// Parameter outside its allowed range
    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    fn invalid(reason: String) -> Self {
        Self::Invalid { reason }
    }
}
