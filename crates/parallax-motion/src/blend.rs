use crate::types::clamp_to_unit_disc;
use glam::Vec2;

/// Per-frame exponential blend from the displayed vector toward the target.
///
/// The running blend state is kept unclamped; what the renderer receives is
/// the blend state pulled back onto the unit disc.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionBlender {
    blended: Vec2,
    displayed: Vec2,
    inertia: Vec2,
}

impl MotionBlender {
    /// `inertia` is the fraction of the remaining gap closed per tick, per axis.
    pub fn new(inertia: Vec2) -> Self {
        Self {
            blended: Vec2::ZERO,
            displayed: Vec2::ZERO,
            inertia,
        }
    }

    /// Advance one rendering tick toward `target` and return the vector to
    /// render this frame.
    pub fn tick(&mut self, target: Vec2) -> Vec2 {
        self.blended += (target - self.blended) * self.inertia;
        self.displayed = clamp_to_unit_disc(self.blended);
        self.displayed
    }

    /// Vector produced by the last tick.
    pub fn displayed(&self) -> Vec2 {
        self.displayed
    }

    pub fn set_inertia(&mut self, inertia: Vec2) {
        self.inertia = inertia;
    }
}
