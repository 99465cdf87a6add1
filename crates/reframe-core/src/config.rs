//! Configuration types for reframe

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optical flow backend used by motion-compensated interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FlowBackend {
    /// Dense per-pixel flow computed directly between luminance planes
    #[default]
    Dense,
    /// Full-grid point tracking reshaped into a dense field
    Sparse,
}

/// How pending output slots are synthesized when upsampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Repeat the preceding frame
    #[default]
    Duplicate,
    /// Average neighbouring frames
    Blend,
    /// Warp the preceding frame along estimated optical flow
    MotionCompensate(FlowBackend),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Duplicate => "dup",
            Strategy::Blend => "blend",
            Strategy::MotionCompensate(FlowBackend::Dense) => "mci-dense",
            Strategy::MotionCompensate(FlowBackend::Sparse) => "mci-sparse",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dup" | "duplicate" => Ok(Strategy::Duplicate),
            "blend" => Ok(Strategy::Blend),
            "mci" | "mci-dense" | "dense" => Ok(Strategy::MotionCompensate(FlowBackend::Dense)),
            "mci-sparse" | "sparse" => Ok(Strategy::MotionCompensate(FlowBackend::Sparse)),
            _ => Err(format!(
                "Invalid strategy: {}. Use: dup, blend, mci-dense, mci-sparse",
                s
            )),
        }
    }
}

/// Four-character codec tag handed to the encoder
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const H264: FourCc = FourCc(*b"H264");
    pub const PNG: FourCc = FourCc(*b"PNG ");

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().trim_end())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", self.as_str())
    }
}

impl std::str::FromStr for FourCc {
    type Err = String;

    /// Tags shorter than four characters are padded with spaces
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(format!("Invalid codec tag: {:?}. Use up to 4 ASCII characters", s));
        }
        let mut tag = [b' '; 4];
        tag[..s.len()].copy_from_slice(s.to_ascii_uppercase().as_bytes());
        Ok(FourCc(tag))
    }
}

/// Color layout written by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
}

/// Optical flow estimator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Horn–Schunck smoothness weight (alpha)
    pub smoothness: f32,
    /// Horn–Schunck relaxation iterations
    pub iterations: usize,
    /// Lucas–Kanade half window size in pixels
    pub window_radius: usize,
    /// Lucas–Kanade refinement iterations per point
    pub max_iterations: usize,
    /// Lucas–Kanade convergence threshold in pixels
    pub epsilon: f32,
    /// Fraction of the estimated motion applied to the first slot after an
    /// anchor; slot `k` gets `1 - (1 - temporal_scale)^k`
    pub temporal_scale: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            smoothness: 15.0,
            iterations: 64,
            window_radius: 3,
            max_iterations: 10,
            epsilon: 0.01,
            temporal_scale: 0.5,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothness.is_finite() && self.smoothness > 0.0) {
            return Err(Error::Config(format!(
                "flow smoothness must be positive, got {}",
                self.smoothness
            )));
        }
        if self.window_radius == 0 {
            return Err(Error::Config("flow window radius must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.temporal_scale) {
            return Err(Error::Config(format!(
                "temporal scale must lie in [0, 1], got {}",
                self.temporal_scale
            )));
        }
        Ok(())
    }
}

/// Main configuration for a frame-rate conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Target frame rate
    pub target_fps: f64,
    /// Synthesis strategy used when upsampling
    pub strategy: Strategy,
    /// Codec tag for the output sink
    pub codec: FourCc,
    /// Output color layout
    pub color: ColorMode,
    /// Flow estimator tuning for motion compensation
    pub flow: FlowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            strategy: Strategy::Duplicate,
            codec: FourCc::H264,
            color: ColorMode::Color,
            flow: FlowConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set target frame rate
    pub fn with_target_fps(mut self, fps: f64) -> Self {
        self.target_fps = fps;
        self
    }

    /// Builder pattern: set strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder pattern: set codec tag
    pub fn with_codec(mut self, codec: FourCc) -> Self {
        self.codec = codec;
        self
    }

    /// Builder pattern: set color mode
    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Builder pattern: set flow tuning
    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    /// Reject settings the resampler cannot work with
    pub fn validate(&self) -> Result<()> {
        validate_fps(self.target_fps, "target")?;
        self.flow.validate()
    }
}

/// Frame rates must be finite and strictly positive
pub fn validate_fps(fps: f64, what: &str) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(Error::Config(format!(
            "{} frame rate must be positive, got {}",
            what, fps
        )));
    }
    Ok(())
}
