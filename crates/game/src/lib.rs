//! Game assembly: build the world from configuration, put a player in it,
//! route input to the player and drive frames.
//!
//! # Invariants
//! - Randomness is drawn from one seeded generator owned by the game.
//! - [`Game::dispose`] stops the loop before releasing the scene.

mod config;
mod game;

pub use config::GameConfig;
pub use game::{Game, GameSummary};

use playground_combat::CombatError;
use playground_scene::SceneError;
use playground_world::WorldError;

/// Errors from game assembly and frame execution.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("world error: {0}")]
    World(#[from] WorldError),
    #[error("combat error: {0}")]
    Combat(#[from] CombatError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}
