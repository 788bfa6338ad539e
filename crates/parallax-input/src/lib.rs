pub mod router;

use glam::Vec2;
use winit::dpi::PhysicalSize;

/// What a window event asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// New pointer steering target.
    Pointer(Vec2),
    /// Viewport changed size.
    Resize(PhysicalSize<u32>),
    /// Re-calibrate: forget the orientation anchors.
    Reset,
    /// Request orientation access, or give it up if currently granted.
    ToggleOrientation,
    /// Reload and re-apply the config file.
    Reload,
    /// Save a still of the current frame.
    Snapshot,
    Exit,
}
