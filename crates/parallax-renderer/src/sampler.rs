use crate::aspect::{aspect_correction, output_uv};
use crate::texture::ImagePair;
use glam::{Vec2, Vec4};
use image::{Rgba, RgbaImage};

/// Reflect a coordinate into `[0, 1]`, tiling the texture back and forth.
///
/// The period is two: `v` is first wrapped into `[0, 2)` with floored
/// modulo (negative inputs included), then the upper half is mirrored.
pub fn mirrored(v: f32) -> f32 {
    let m = v - 2.0 * (v / 2.0).floor();
    if m >= 1.0 {
        2.0 - m
    } else {
        m
    }
}

pub fn mirrored_vec2(v: Vec2) -> Vec2 {
    Vec2::new(mirrored(v.x), mirrored(v.y))
}

/// Shift `uv` by the depth-weighted steering vector.
///
/// Depth 0.5 stays put; nearer (brighter) texels move with the steering
/// vector and farther ones against it.
pub fn displace(uv: Vec2, depth: f32, displayed: Vec2, thresholds: Vec2) -> Vec2 {
    uv + (depth - 0.5) * displayed / thresholds
}

/// CPU implementation of the parallax shader.
///
/// Follows `assets/shaders/parallax.wgsl`: bilinear clamp-to-edge fetches,
/// the color image decoded from sRGB and filtered in linear space like an
/// `Rgba8UnormSrgb` texture, the depth map read as raw unorm values.
/// Results can still differ from a GPU by filtering precision.
pub struct ParallaxSampler<'a> {
    images: &'a ImagePair,
    thresholds: Vec2,
}

impl<'a> ParallaxSampler<'a> {
    pub fn new(images: &'a ImagePair, thresholds: Vec2) -> Self {
        Self { images, thresholds }
    }

    /// Linear color for the undisplaced image coordinate `uv`.
    pub fn sample(&self, uv: Vec2, displayed: Vec2) -> Vec4 {
        let depth = fetch_bilinear(&self.images.depth, mirrored_vec2(uv), Encoding::Unorm).x;
        let coord = displace(uv, depth, displayed, self.thresholds);
        fetch_bilinear(&self.images.color, mirrored_vec2(coord), Encoding::Srgb)
    }

    /// Render a full frame of `width` x `height` pixels.
    pub fn render(&self, width: u32, height: u32, displayed: Vec2) -> RgbaImage {
        let resolution = Vec2::new(width as f32, height as f32);
        let aspect = aspect_correction(resolution, self.images.aspect());

        RgbaImage::from_fn(width, height, |x, y| {
            let frag = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let uv = output_uv(frag, resolution, 1.0, aspect);
            to_rgba(self.sample(uv, displayed))
        })
    }
}

#[derive(Clone, Copy)]
enum Encoding {
    Unorm,
    Srgb,
}

/// Bilinear fetch in normalized coordinates, clamping at the edges.
fn fetch_bilinear(image: &RgbaImage, uv: Vec2, encoding: Encoding) -> Vec4 {
    let (width, height) = image.dimensions();
    let x = uv.x * width as f32 - 0.5;
    let y = uv.y * height as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);

    let texel = |ix: f32, iy: f32| -> Vec4 {
        let cx = (ix as i64).clamp(0, width as i64 - 1) as u32;
        let cy = (iy as i64).clamp(0, height as i64 - 1) as u32;
        let [r, g, b, a] = image.get_pixel(cx, cy).0.map(|c| c as f32 / 255.0);
        match encoding {
            Encoding::Unorm => Vec4::new(r, g, b, a),
            Encoding::Srgb => Vec4::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a),
        }
    };

    let top = texel(x0, y0).lerp(texel(x0 + 1.0, y0), fx);
    let bottom = texel(x0, y0 + 1.0).lerp(texel(x0 + 1.0, y0 + 1.0), fx);
    top.lerp(bottom, fy)
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Encode a linear color as sRGB bytes, as an sRGB render target would.
fn to_rgba(color: Vec4) -> Rgba<u8> {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE);
    let encoded = [linear_to_srgb(c.x), linear_to_srgb(c.y), linear_to_srgb(c.z), c.w];
    Rgba(encoded.map(|v| (v * 255.0).round() as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_pair(depth: u8) -> ImagePair {
        // Red ramps left to right, green top to bottom.
        let color = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, 0, 255]));
        let depth = RgbaImage::from_pixel(64, 64, Rgba([depth, depth, depth, 255]));
        ImagePair::new(color, depth).unwrap()
    }

    #[test]
    fn mirrored_reflects_with_period_two() {
        assert_eq!(mirrored(0.0), 0.0);
        assert_eq!(mirrored(0.25), 0.25);
        assert_eq!(mirrored(1.0), 1.0);
        assert_eq!(mirrored(1.5), 0.5);
        assert_eq!(mirrored(2.0), 0.0);
        assert_eq!(mirrored(3.25), 0.75);
    }

    #[test]
    fn mirrored_handles_negative_input() {
        // -0.5 wraps to 1.5 first, then reflects to 0.5.
        assert_eq!(mirrored(-0.5), 0.5);
        assert_eq!(mirrored(-1.0), 1.0);
        assert!((mirrored(-0.1) - 0.1).abs() < 1e-6);
        assert_eq!(mirrored(-2.0), 0.0);
    }

    #[test]
    fn mirrored_is_continuous_at_the_seams() {
        for seam in [-1.0_f32, 0.0, 1.0, 2.0] {
            let below = mirrored(seam - 1e-3);
            let above = mirrored(seam + 1e-3);
            assert!((below - above).abs() < 1e-2, "seam at {seam}");
        }
    }

    #[test]
    fn displacement_scales_with_depth_and_threshold() {
        let uv = Vec2::new(0.5, 0.5);
        let steer = Vec2::new(1.0, -1.0);

        assert_eq!(displace(uv, 0.5, steer, Vec2::new(10.0, 10.0)), uv);

        let near = displace(uv, 1.0, steer, Vec2::new(10.0, 5.0));
        assert!((near - Vec2::new(0.55, 0.4)).length() < 1e-6);

        let far = displace(uv, 0.0, steer, Vec2::new(10.0, 5.0));
        assert!((far - Vec2::new(0.45, 0.6)).length() < 1e-6);

        // A larger threshold gives a subtler shift.
        let subtle = displace(uv, 1.0, steer, Vec2::new(40.0, 20.0));
        assert!((subtle - uv).length() < (near - uv).length());
    }

    #[test]
    fn zero_steering_renders_the_undisplaced_image() {
        let images = gradient_pair(255);
        let sampler = ParallaxSampler::new(&images, Vec2::new(0.01, 0.01));
        let still = sampler.render(64, 64, Vec2::ZERO);
        // Same aspect, one output pixel per texel.
        assert_eq!(still.get_pixel(10, 20), images.color.get_pixel(10, 20));
        assert_eq!(still.get_pixel(63, 0), images.color.get_pixel(63, 0));
    }

    #[test]
    fn color_is_filtered_in_linear_space() {
        let color = RgbaImage::from_fn(2, 1, |x, _| {
            let v = if x == 0 { 0 } else { 255 };
            Rgba([v, v, v, 255])
        });
        let depth = RgbaImage::from_pixel(2, 1, Rgba([128, 128, 128, 255]));
        let images = ImagePair::new(color, depth).unwrap();
        let sampler = ParallaxSampler::new(&images, Vec2::ONE);

        // Halfway between a black and a white texel.
        let mid = sampler.sample(Vec2::new(0.5, 0.5), Vec2::ZERO);
        assert!((mid.x - 0.5).abs() < 1e-4);
        assert!((mid.w - 1.0).abs() < 1e-6);
        // Linear 0.5 encodes to sRGB 188, not the byte average 128.
        assert_eq!(to_rgba(mid), Rgba([188, 188, 188, 255]));
    }

    #[test]
    fn srgb_bytes_survive_decode_and_encode() {
        for byte in 0..=255u8 {
            let linear = srgb_to_linear(byte as f32 / 255.0);
            let back = (linear_to_srgb(linear) * 255.0).round() as u8;
            assert_eq!(back, byte);
        }
    }

    #[test]
    fn near_depth_follows_the_steering_vector() {
        let images = gradient_pair(255);
        let sampler = ParallaxSampler::new(&images, Vec2::new(10.0, 10.0));

        let center = Vec2::splat(0.5);
        let rest = sampler.sample(center, Vec2::ZERO);
        let right = sampler.sample(center, Vec2::new(1.0, 0.0));

        // Red grows with u, green is untouched.
        assert!(right.x > rest.x);
        assert!((right.y - rest.y).abs() < 1e-6);
    }

    #[test]
    fn extreme_displacement_samples_a_mirrored_image() {
        let images = gradient_pair(255);
        // 0.5 * 1 / 0.25 = 2 texture widths of shift.
        let sampler = ParallaxSampler::new(&images, Vec2::new(0.25, 1.0));
        let uv = Vec2::new(0.25, 0.5);
        let shifted = sampler.sample(uv, Vec2::new(1.0, 0.0));
        let rest = sampler.sample(uv, Vec2::ZERO);
        // 0.25 + 2.0 mirrors back onto 0.25.
        assert!((shifted - rest).length() < 1e-4);
    }
}
