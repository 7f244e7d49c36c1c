use playground_common::Key;
use tracing::debug;

use crate::action::Action;

/// Raw events as delivered by the input surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerClick,
    PointerMove { dx: f32, dy: f32 },
    KeyDown(Key),
    KeyUp(Key),
    /// The surface gained (`true`) or lost pointer capture.
    PointerLockChanged(bool),
}

/// Maps raw events to actions and tracks whether the pointer is captured.
#[derive(Debug, Clone)]
pub struct InputBinding {
    pub is_locked: bool,
    pub jump_key: Key,
}

impl Default for InputBinding {
    fn default() -> Self {
        Self {
            is_locked: false,
            jump_key: Key::Space,
        }
    }
}

impl InputBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one event. A click while the pointer is free both requests
    /// capture and fires; pointer motion only steers the view once captured.
    pub fn map(&mut self, event: InputEvent) -> Vec<Action> {
        match event {
            InputEvent::PointerClick => {
                if self.is_locked {
                    vec![Action::Fire]
                } else {
                    vec![Action::RequestPointerLock, Action::Fire]
                }
            }
            InputEvent::PointerMove { dx, dy } => {
                if self.is_locked {
                    vec![Action::Look { dx, dy }]
                } else {
                    Vec::new()
                }
            }
            InputEvent::KeyDown(key) => vec![Action::Press(key)],
            InputEvent::KeyUp(key) if key == self.jump_key => {
                vec![Action::Release(key), Action::Jump]
            }
            InputEvent::KeyUp(key) => vec![Action::Release(key)],
            InputEvent::PointerLockChanged(locked) => {
                debug!(locked, "pointer lock changed");
                self.is_locked = locked;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_when_unlocked_requests_lock_and_fires() {
        let mut binding = InputBinding::new();
        assert_eq!(
            binding.map(InputEvent::PointerClick),
            vec![Action::RequestPointerLock, Action::Fire]
        );
    }

    #[test]
    fn click_when_locked_only_fires() {
        let mut binding = InputBinding::new();
        binding.map(InputEvent::PointerLockChanged(true));
        assert!(binding.is_locked);
        assert_eq!(binding.map(InputEvent::PointerClick), vec![Action::Fire]);
    }

    #[test]
    fn space_release_jumps() {
        let mut binding = InputBinding::new();
        let actions = binding.map(InputEvent::KeyUp(Key::Space));
        assert!(actions.contains(&Action::Jump));
        let actions = binding.map(InputEvent::KeyDown(Key::Space));
        assert!(!actions.contains(&Action::Jump));
        let actions = binding.map(InputEvent::KeyUp(Key::W));
        assert_eq!(actions, vec![Action::Release(Key::W)]);
    }

    #[test]
    fn pointer_motion_needs_lock() {
        let mut binding = InputBinding::new();
        assert!(binding.map(InputEvent::PointerMove { dx: 1.0, dy: 2.0 }).is_empty());
        binding.map(InputEvent::PointerLockChanged(true));
        assert_eq!(
            binding.map(InputEvent::PointerMove { dx: 1.0, dy: 2.0 }),
            vec![Action::Look { dx: 1.0, dy: 2.0 }]
        );
        binding.map(InputEvent::PointerLockChanged(false));
        assert!(!binding.is_locked);
    }
}
