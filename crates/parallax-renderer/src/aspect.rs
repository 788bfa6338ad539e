use glam::Vec2;

/// Scale factors `(a1, a2)` that fit the image into the container without
/// distortion.
///
/// `image_aspect` is the image's height over width. The axis along which the
/// container is relatively longer gets a factor below one, so only the
/// central part of the image is sampled along it (cover fit). Both factors
/// lie in `(0, 1]`. A container without area leaves the mapping unchanged.
pub fn aspect_correction(container: Vec2, image_aspect: f32) -> Vec2 {
    if container.x <= 0.0 || container.y <= 0.0 || !(image_aspect > 0.0) {
        return Vec2::ONE;
    }
    let container_aspect = container.y / container.x;
    if container_aspect < image_aspect {
        Vec2::new(1.0, container_aspect / image_aspect)
    } else {
        Vec2::new(container.x / container.y * image_aspect, 1.0)
    }
}

/// Map an output pixel position to the image coordinate it samples before
/// any displacement. `frag` and `resolution` use a top-left origin; the
/// result is in texture space with `v` growing downwards.
pub fn output_uv(frag: Vec2, resolution: Vec2, pixel_ratio: f32, aspect: Vec2) -> Vec2 {
    let uv = pixel_ratio * frag / resolution;
    (uv - Vec2::splat(0.5)) * aspect + Vec2::splat(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_unit_square(v: Vec2) {
        assert!((-1e-6..=1.0 + 1e-6).contains(&v.x), "{v}");
        assert!((-1e-6..=1.0 + 1e-6).contains(&v.y), "{v}");
    }

    #[test]
    fn matching_aspect_needs_no_correction() {
        let a = aspect_correction(Vec2::new(1600.0, 900.0), 900.0 / 1600.0);
        assert!((a - Vec2::ONE).length() < 1e-6);
    }

    #[test]
    fn wide_container_crops_vertically() {
        // 2:1 container, 4:3 image.
        let a = aspect_correction(Vec2::new(1000.0, 500.0), 0.75);
        assert_eq!(a.x, 1.0);
        assert!((a.y - 0.5 / 0.75).abs() < 1e-6);
    }

    #[test]
    fn narrow_container_crops_horizontally() {
        // Portrait phone container, landscape image.
        let a = aspect_correction(Vec2::new(400.0, 800.0), 0.5);
        assert!((a.x - 0.25).abs() < 1e-6);
        assert_eq!(a.y, 1.0);
    }

    #[test]
    fn corrected_region_stays_inside_image() {
        for (container, image_aspect) in [
            (Vec2::new(1000.0, 500.0), 0.75),
            (Vec2::new(400.0, 800.0), 0.5),
            (Vec2::new(640.0, 480.0), 0.75),
        ] {
            let aspect = aspect_correction(container, image_aspect);
            for corner in [Vec2::ZERO, Vec2::new(container.x, 0.0), Vec2::new(0.0, container.y), container] {
                assert_in_unit_square(output_uv(corner, container, 1.0, aspect));
            }
        }
    }

    #[test]
    fn zero_area_container_is_identity() {
        assert_eq!(aspect_correction(Vec2::new(0.0, 300.0), 0.75), Vec2::ONE);
    }

    #[test]
    fn pixel_ratio_maps_physical_to_logical() {
        let uv = output_uv(Vec2::new(800.0, 600.0), Vec2::new(400.0, 300.0), 0.5, Vec2::ONE);
        assert!((uv - Vec2::ONE).length() < 1e-6);
    }
}
