//! Per-frame keyboard and mouse state
//!
//! `InputState` is owned by the application and fed from window events. Key
//! state is double-buffered so callers can ask for held keys as well as the
//! press/release edges since the last `end_frame`.

use std::collections::HashSet;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, ModifiersState};

pub struct InputState {
    current_keys: HashSet<KeyCode>,
    previous_keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_position: (f32, f32),
    previous_mouse_position: (f32, f32),
    mouse_delta: (f32, f32),
    modifiers: ModifiersState,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_keys: HashSet::new(),
            previous_keys: HashSet::new(),
            mouse_buttons: HashSet::new(),
            mouse_position: (0.0, 0.0),
            previous_mouse_position: (0.0, 0.0),
            mouse_delta: (0.0, 0.0),
            modifiers: ModifiersState::empty(),
        }
    }

    /// Closes the frame: snapshots keys for edge detection and clears
    /// per-frame mouse motion.
    pub fn end_frame(&mut self) {
        self.previous_keys.clone_from(&self.current_keys);
        self.previous_mouse_position = self.mouse_position;
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn key_down(&mut self, key: KeyCode) {
        self.current_keys.insert(key);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.current_keys.remove(&key);
    }

    #[must_use]
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.current_keys.contains(&key)
    }

    /// True only on the frame the key went down.
    #[must_use]
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.current_keys.contains(&key) && !self.previous_keys.contains(&key)
    }

    /// True only on the frame the key went up.
    #[must_use]
    pub fn key_released(&self, key: KeyCode) -> bool {
        !self.current_keys.contains(&key) && self.previous_keys.contains(&key)
    }

    pub fn mouse_down(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn mouse_up(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    #[must_use]
    pub fn mouse_button_held(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse_position = (x, y);
    }

    #[must_use]
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Cursor movement since the previous frame, in window coordinates.
    #[must_use]
    pub fn cursor_delta(&self) -> (f32, f32) {
        (
            self.mouse_position.0 - self.previous_mouse_position.0,
            self.mouse_position.1 - self.previous_mouse_position.1,
        )
    }

    /// Raw device motion arrives several times per frame, so it accumulates.
    pub fn add_mouse_motion(&mut self, delta_x: f32, delta_y: f32) {
        self.mouse_delta.0 += delta_x;
        self.mouse_delta.1 += delta_y;
    }

    #[must_use]
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.shift_key()
    }

    #[must_use]
    pub fn control(&self) -> bool {
        self.modifiers.control_key()
    }

    /// Drops everything held, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.current_keys.clear();
        self.mouse_buttons.clear();
        self.mouse_delta = (0.0, 0.0);
        self.modifiers = ModifiersState::empty();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edge_lasts_one_frame() {
        let mut input = InputState::new();

        input.key_down(KeyCode::KeyW);
        assert!(input.key_pressed(KeyCode::KeyW));
        assert!(input.key_held(KeyCode::KeyW));
        input.end_frame();

        assert!(!input.key_pressed(KeyCode::KeyW));
        assert!(input.key_held(KeyCode::KeyW));
    }

    #[test]
    fn test_release_edge() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyA);
        input.end_frame();
        input.key_up(KeyCode::KeyA);

        assert!(input.key_released(KeyCode::KeyA));
        assert!(!input.key_held(KeyCode::KeyA));

        input.end_frame();
        assert!(!input.key_released(KeyCode::KeyA));
    }

    #[test]
    fn test_mouse_motion_accumulates_until_end_of_frame() {
        let mut input = InputState::new();
        input.add_mouse_motion(2.0, -1.0);
        input.add_mouse_motion(3.0, 0.5);
        assert_eq!(input.mouse_delta(), (5.0, -0.5));

        input.end_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_cursor_delta() {
        let mut input = InputState::new();
        input.set_mouse_position(10.0, 20.0);
        input.end_frame();
        input.set_mouse_position(15.0, 18.0);
        assert_eq!(input.cursor_delta(), (5.0, -2.0));
    }

    #[test]
    fn test_mouse_buttons_and_modifiers() {
        let mut input = InputState::new();
        input.mouse_down(MouseButton::Left);
        assert!(input.mouse_button_held(MouseButton::Left));
        input.mouse_up(MouseButton::Left);
        assert!(!input.mouse_button_held(MouseButton::Left));

        input.set_modifiers(ModifiersState::SHIFT);
        assert!(input.shift());
        assert!(!input.control());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyD);
        input.mouse_down(MouseButton::Right);
        input.clear();
        assert!(!input.key_held(KeyCode::KeyD));
        assert!(!input.mouse_button_held(MouseButton::Right));
    }
}
