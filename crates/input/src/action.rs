use playground_common::Key;

/// A high-level action produced from raw input.
///
/// The player and the scene consume actions, never raw events, so the same
/// gameplay runs whatever surface the events came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Fire the equipped weapon.
    Fire,
    /// Start a jump.
    Jump,
    /// Ask the surface for exclusive pointer capture.
    RequestPointerLock,
    /// Rotate the view by a pointer delta in pixels.
    Look { dx: f32, dy: f32 },
    /// A key went down; the engine uses held keys for camera movement.
    Press(Key),
    /// A key came up.
    Release(Key),
}
