use glam::Vec2;
use serde::Deserialize;

/// One raw orientation reading, in degrees.
///
/// Any axis may be missing; such a sample carries no usable tilt and is
/// dropped by the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct OrientationSample {
    /// Rotation around the vertical axis (compass heading). Logged only.
    pub alpha: Option<f64>,
    /// Front/back tilt.
    pub beta: Option<f64>,
    /// Left/right tilt.
    pub gamma: Option<f64>,
}

impl OrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// `(alpha, beta, gamma)` when every axis is present.
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((self.alpha?, self.beta?, self.gamma?))
    }
}

/// Scale `v` back onto the unit circle if it lies outside it.
pub fn clamp_to_unit_disc(v: Vec2) -> Vec2 {
    let radius = v.length();
    if radius > 1.0 {
        v / radius
    } else {
        v
    }
}
