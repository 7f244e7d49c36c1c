//! Input: camera strategies and the mapping from raw pointer/keyboard
//! events to player actions.
//!
//! # Invariants
//! - Gameplay consumes [`Action`]s, never raw [`InputEvent`]s.
//! - Pointer-lock state lives on [`InputBinding`], not in process-wide listeners.

pub mod action;
pub mod binding;
pub mod camera;

pub use action::Action;
pub use binding::{InputBinding, InputEvent};
pub use camera::CameraStrategy;

use playground_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("camera setup failed: {0}")]
    Scene(#[from] SceneError),
}
