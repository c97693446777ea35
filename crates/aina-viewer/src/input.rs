//! Pointer input mapping
//!
//! Turns winit pointer events into camera gestures: primary-button drag
//! orbits, middle-button drag pans, the wheel zooms. Input never touches
//! GPU state; the viewer applies the resulting [`CameraAction`].

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Wheel units per notch, matching the usual 120-per-step convention
pub const WHEEL_UNITS_PER_LINE: f32 = 120.0;

/// A camera gesture in pointer units (pixels or wheel units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    Rotate { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    Zoom(f32),
}

/// Tracks held buttons and the last cursor position between events
#[derive(Debug, Clone, Default)]
pub struct PointerInput {
    primary_held: bool,
    middle_held: bool,
    last_position: Option<Vec2>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a window event; returns a camera gesture when one results.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<CameraAction> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, *state);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32))
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_position = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => Self::scroll(*delta),
            WindowEvent::Focused(false) => {
                self.primary_held = false;
                self.middle_held = false;
                None
            }
            _ => None,
        }
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.primary_held = pressed,
            MouseButton::Middle => self.middle_held = pressed,
            _ => {}
        }
    }

    /// Cursor moved to `position`. The primary button wins over middle.
    pub fn cursor_moved(&mut self, position: Vec2) -> Option<CameraAction> {
        let last = self.last_position.replace(position)?;
        let delta = position - last;
        if delta == Vec2::ZERO {
            return None;
        }

        if self.primary_held {
            Some(CameraAction::Rotate {
                dx: delta.x,
                dy: delta.y,
            })
        } else if self.middle_held {
            Some(CameraAction::Pan {
                dx: delta.x,
                dy: delta.y,
            })
        } else {
            None
        }
    }

    /// Wheel delta in wheel units; positive zooms in.
    pub fn scroll(delta: MouseScrollDelta) -> Option<CameraAction> {
        let units = match delta {
            MouseScrollDelta::LineDelta(_, y) => y * WHEEL_UNITS_PER_LINE,
            MouseScrollDelta::PixelDelta(position) => position.y as f32,
        };
        (units != 0.0).then_some(CameraAction::Zoom(units))
    }

    pub fn is_dragging(&self) -> bool {
        self.primary_held || self.middle_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_primary_drag_rotates() {
        let mut input = PointerInput::new();
        assert_eq!(input.cursor_moved(Vec2::new(10.0, 10.0)), None);
        input.mouse_button(MouseButton::Left, ElementState::Pressed);

        assert_eq!(
            input.cursor_moved(Vec2::new(14.0, 7.0)),
            Some(CameraAction::Rotate { dx: 4.0, dy: -3.0 })
        );
    }

    #[test]
    fn test_middle_drag_pans_and_primary_wins() {
        let mut input = PointerInput::new();
        input.cursor_moved(Vec2::ZERO);
        input.mouse_button(MouseButton::Middle, ElementState::Pressed);
        assert_eq!(
            input.cursor_moved(Vec2::new(2.0, 1.0)),
            Some(CameraAction::Pan { dx: 2.0, dy: 1.0 })
        );

        input.mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(matches!(
            input.cursor_moved(Vec2::new(3.0, 1.0)),
            Some(CameraAction::Rotate { .. })
        ));
    }

    #[test]
    fn test_moves_without_buttons_do_nothing() {
        let mut input = PointerInput::new();
        input.cursor_moved(Vec2::ZERO);
        input.mouse_button(MouseButton::Right, ElementState::Pressed);
        assert_eq!(input.cursor_moved(Vec2::new(5.0, 5.0)), None);

        input.mouse_button(MouseButton::Left, ElementState::Pressed);
        input.mouse_button(MouseButton::Left, ElementState::Released);
        assert_eq!(input.cursor_moved(Vec2::new(9.0, 9.0)), None);
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_scroll_units() {
        assert_eq!(
            PointerInput::scroll(MouseScrollDelta::LineDelta(0.0, 1.0)),
            Some(CameraAction::Zoom(120.0))
        );
        assert_eq!(
            PointerInput::scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -30.0))),
            Some(CameraAction::Zoom(-30.0))
        );
        assert_eq!(PointerInput::scroll(MouseScrollDelta::LineDelta(1.0, 0.0)), None);
    }
}
