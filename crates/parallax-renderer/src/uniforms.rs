use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

/// Uniform block shared with `parallax.wgsl`.
///
/// Field order and padding match the WGSL struct (48 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParallaxUniforms {
    /// Logical width, logical height, then the aspect factors `a1, a2`.
    pub resolution: [f32; 4],
    /// Displayed steering vector.
    pub mouse: [f32; 2],
    /// Horizontal and vertical displacement thresholds.
    pub threshold: [f32; 2],
    /// Seconds since start.
    pub time: f32,
    /// Logical pixels per physical pixel.
    pub pixel_ratio: f32,
    pub _pad: [f32; 2],
}

/// One uniform update. Each variant carries exactly the shape its slot takes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Resolution(Vec4),
    Mouse(Vec2),
    Threshold(Vec2),
    Time(f32),
    PixelRatio(f32),
}

impl ParallaxUniforms {
    pub fn set(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Resolution(v) => self.resolution = v.to_array(),
            Uniform::Mouse(v) => self.mouse = v.to_array(),
            Uniform::Threshold(v) => self.threshold = v.to_array(),
            Uniform::Time(t) => self.time = t,
            Uniform::PixelRatio(r) => self.pixel_ratio = r,
        }
    }

    pub fn with(mut self, uniform: Uniform) -> Self {
        self.set(uniform);
        self
    }
}
