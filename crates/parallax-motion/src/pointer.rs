use glam::Vec2;

/// Steering vector for an absolute pointer position.
///
/// The viewport center maps to zero, the top-left corner to `(1, 1)` and the
/// bottom-right corner to `(-1, -1)`. No clamping is applied; positions past
/// the viewport edge produce components beyond one. A viewport without area
/// yields no movement.
pub fn pointer_steering(pointer: Vec2, viewport: Vec2) -> Vec2 {
    let half = viewport / 2.0;
    if half.x <= 0.0 || half.y <= 0.0 {
        return Vec2::ZERO;
    }
    (half - pointer) / half
}
