use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState};

/// Current input state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases are not delivered while unfocused.
                    self.keys_down.clear();
                }
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    if self.keys_down.remove(key) {
                        frame.keys_released.insert(*key);
                    }
                }
            },

            InputEvent::MouseMotion { dx, dy } => {
                if self.focused {
                    frame.mouse_delta.0 += dx;
                    frame.mouse_delta.1 += dy;
                }
            }
        }

        frame.events.push(ev);
    }

    /// Level query used by update steps (`get_key_state`).
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_and_release_track_level_and_edges() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::Q, KeyState::Pressed));
        assert!(state.key_down(Key::Q));
        assert!(frame.keys_pressed.contains(&Key::Q));

        // Auto-repeat presses do not produce a second edge.
        frame.clear();
        state.apply_event(&mut frame, key(Key::Q, KeyState::Pressed));
        assert!(frame.keys_pressed.is_empty());

        state.apply_event(&mut frame, key(Key::Q, KeyState::Released));
        assert!(!state.key_down(Key::Q));
        assert!(frame.keys_released.contains(&Key::Q));
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::Focused(true));
        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.key_down(Key::W));
    }

    #[test]
    fn mouse_motion_accumulates_while_focused() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::MouseMotion { dx: 5.0, dy: 1.0 });
        assert_eq!(frame.mouse_delta, (0.0, 0.0));

        state.apply_event(&mut frame, InputEvent::Focused(true));
        state.apply_event(&mut frame, InputEvent::MouseMotion { dx: 2.0, dy: -1.0 });
        state.apply_event(&mut frame, InputEvent::MouseMotion { dx: 3.0, dy: 4.0 });
        assert_eq!(frame.take_mouse_delta(), (5.0, 3.0));
        assert_eq!(frame.mouse_delta, (0.0, 0.0));
    }
}
