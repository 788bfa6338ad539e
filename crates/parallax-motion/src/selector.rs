use glam::Vec2;

/// Which input currently drives the parallax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringSource {
    Pointer,
    Orientation,
}

/// Holds the latest target from each source and picks the active one.
///
/// The pointer target is always kept up to date so that detaching the
/// orientation source falls straight back to it; the blender smooths the
/// switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringSelector {
    source: SteeringSource,
    pointer: Vec2,
    orientation: Option<Vec2>,
}

impl Default for SteeringSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SteeringSelector {
    pub fn new() -> Self {
        Self {
            source: SteeringSource::Pointer,
            pointer: Vec2::ZERO,
            orientation: None,
        }
    }

    pub fn set_pointer(&mut self, target: Vec2) {
        self.pointer = target;
    }

    /// Latest orientation target, `None` until the tracker has produced one.
    pub fn set_orientation(&mut self, target: Option<Vec2>) {
        self.orientation = target;
    }

    pub fn activate(&mut self, source: SteeringSource) {
        if source != self.source {
            tracing::info!(?source, "Steering source changed");
        }
        if source == SteeringSource::Pointer {
            self.orientation = None;
        }
        self.source = source;
    }

    pub fn source(&self) -> SteeringSource {
        self.source
    }

    /// Target for this frame.
    pub fn target(&self) -> Vec2 {
        match (self.source, self.orientation) {
            (SteeringSource::Orientation, Some(target)) => target,
            _ => self.pointer,
        }
    }
}
