use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orientation tracking and pointer blending.
    pub motion: MotionConfig,
    /// Image pair and displacement strength.
    pub scene: SceneConfig,
    /// Orientation sample stream.
    pub orientation: OrientationConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motion.validate()?;
        self.scene.validate()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window_size must be at least 1")]
    WindowSize,
    #[error("{name} must be in (0, 1], got {value}")]
    Inertia { name: &'static str, value: f64 },
    #[error("variance_threshold must be finite and positive, got {0}")]
    VarianceThreshold(f64),
    #[error("max_tilt_degrees must be finite and positive, got {0}")]
    MaxTilt(f64),
    #[error("{name} must be finite and non-zero, got {value}")]
    Threshold { name: &'static str, value: f32 },
}

/// Which tilt axis is inverted when mapping device tilt to the steering vector.
///
/// X is derived from beta (front/back tilt) and Y from gamma (left/right tilt);
/// exactly one of them has its sign flipped so that tilting the device pans the
/// picture the same way the pointer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisConvention {
    /// X follows beta, Y follows inverted gamma.
    InvertY,
    /// X follows inverted beta, Y follows gamma.
    InvertX,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Number of samples in the circular window used for mean/variance.
    pub window_size: usize,
    /// Both axes must have a window variance below this to re-anchor.
    pub variance_threshold: f64,
    /// When false the home anchor stays on the first sample after a reset.
    pub drift_correction: bool,
    /// Per-sample factor pulling the current anchor toward the home anchor.
    pub home_inertia: f64,
    /// Per-frame blend factor of the displayed vector, X and Y independently.
    ///
    /// The two axes do not have to match. `[0.85, 0.05]` gives a snappy
    /// horizontal response with a slow vertical one.
    #[serde(with = "vec2_serde")]
    pub display_inertia: Vec2,
    /// Tilt (degrees) that maps to full deflection, `[beta, gamma]`.
    pub max_tilt_degrees: [f64; 2],
    pub axis_convention: AxisConvention,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            variance_threshold: 0.01,
            drift_correction: true,
            home_inertia: 0.05,
            display_inertia: Vec2::new(0.05, 0.05),
            max_tilt_degrees: [15.0, 15.0],
            axis_convention: AxisConvention::InvertY,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::WindowSize);
        }
        if !(self.variance_threshold.is_finite() && self.variance_threshold > 0.0) {
            return Err(ConfigError::VarianceThreshold(self.variance_threshold));
        }
        check_inertia("home_inertia", self.home_inertia)?;
        check_inertia("display_inertia.x", self.display_inertia.x as f64)?;
        check_inertia("display_inertia.y", self.display_inertia.y as f64)?;
        for tilt in self.max_tilt_degrees {
            if !(tilt.is_finite() && tilt > 0.0) {
                return Err(ConfigError::MaxTilt(tilt));
            }
        }
        Ok(())
    }
}

fn check_inertia(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Inertia { name, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Color image shown on screen.
    pub color_image: PathBuf,
    /// Depth map; only the red channel is read. Bright = near.
    pub depth_image: PathBuf,
    /// Larger values give a subtler horizontal displacement.
    pub horizontal_threshold: f32,
    /// Larger values give a subtler vertical displacement.
    pub vertical_threshold: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            color_image: PathBuf::from("assets/images/color.jpg"),
            depth_image: PathBuf::from("assets/images/depth.jpg"),
            horizontal_threshold: 35.0,
            vertical_threshold: 15.0,
        }
    }
}

impl SceneConfig {
    /// `[horizontal, vertical]` as handed to the sampler.
    pub fn thresholds(&self) -> Vec2 {
        Vec2::new(self.horizontal_threshold, self.vertical_threshold)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("horizontal_threshold", self.horizontal_threshold),
            ("vertical_threshold", self.vertical_threshold),
        ] {
            if !value.is_finite() || value == 0.0 {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Request orientation access at startup.
    pub enabled: bool,
    /// `host:port` of the orientation sample stream.
    pub endpoint: String,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "127.0.0.1:5555".into(),
        }
    }
}

// Glam vectors are written as plain arrays to keep the TOML readable.
mod vec2_serde {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f32; 2]>::deserialize(d)?;
        Ok(Vec2::new(x, y))
    }
}
