use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Current keyboard state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an input event to the current state.
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Release events are not delivered while unfocused.
                    self.keys_down.clear();
                }
            }

            InputEvent::Key { key, state: KeyState::Pressed } => {
                self.keys_down.insert(key);
            }

            InputEvent::Key { key, state: KeyState::Released } => {
                self.keys_down.remove(&key);
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}
