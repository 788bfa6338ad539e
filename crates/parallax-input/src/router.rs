use crate::InputAction;
use glam::Vec2;
use parallax_motion::pointer_steering;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Maps window events onto steering and control actions.
///
/// Pointer positions are normalized against the last known viewport size.
pub struct InputRouter {
    viewport: Vec2,
}

impl InputRouter {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Vec2::new(width as f32, height as f32),
        }
    }

    pub fn set_viewport(&mut self, size: PhysicalSize<u32>) {
        self.viewport = Vec2::new(size.width as f32, size.height as f32);
    }

    pub fn on_window_event(&mut self, event: &WindowEvent) -> Option<InputAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                Some(self.on_cursor_moved(position.x, position.y))
            }
            WindowEvent::Resized(size) => {
                self.set_viewport(*size);
                Some(InputAction::Resize(*size))
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            WindowEvent::CloseRequested => Some(InputAction::Exit),
            _ => None,
        }
    }

    pub fn on_cursor_moved(&self, x: f64, y: f64) -> InputAction {
        InputAction::Pointer(pointer_steering(
            Vec2::new(x as f32, y as f32),
            self.viewport,
        ))
    }

    fn on_key(&self, event: &KeyEvent) -> Option<InputAction> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        match event.physical_key {
            PhysicalKey::Code(code) => key_action(code),
            _ => None,
        }
    }
}

fn key_action(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyR => Some(InputAction::Reset),
        KeyCode::KeyG => Some(InputAction::ToggleOrientation),
        KeyCode::F5 => Some(InputAction::Reload),
        KeyCode::F12 => Some(InputAction::Snapshot),
        KeyCode::Escape => Some(InputAction::Exit),
        _ => None,
    }
}
