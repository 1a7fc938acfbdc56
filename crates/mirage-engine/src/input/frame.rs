use std::collections::HashSet;

use super::types::{InputEvent, Key};

/// Input deltas accumulated since they were last consumed.
///
/// [`InputState`](super::InputState) holds the level state (held keys);
/// `InputFrame` holds transitions and relative motion.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,

    /// Accumulated raw mouse motion.
    pub mouse_delta: (f32, f32),
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Returns the accumulated mouse motion and resets it.
    pub fn take_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }
}
