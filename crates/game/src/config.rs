use std::path::{Path, PathBuf};

use playground_combat::{JumpConfig, WeaponKind};
use playground_input::CameraStrategy;
use playground_world::WorldConfig;
use serde::{Deserialize, Serialize};

use crate::GameError;

/// Everything needed to assemble a game. Every field has a default, so a
/// config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Directory textures, sounds and the heightmap are resolved against.
    pub asset_root: PathBuf,
    /// Fixed seed for reproducible worlds; random when absent.
    pub seed: Option<u64>,
    pub camera: CameraStrategy,
    /// Starting weapon; `null` starts unarmed.
    pub weapon: Option<WeaponKind>,
    pub frame_rate: u32,
    pub world: WorldConfig,
    pub jump: JumpConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            seed: None,
            camera: CameraStrategy::Universal,
            weapon: Some(WeaponKind::LaserGun),
            frame_rate: 60,
            world: WorldConfig::default(),
            jump: JumpConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&data)?)
        } else {
            Self::from_yaml(&data)
        }
    }

    pub fn from_yaml(data: &str) -> Result<Self, GameError> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn to_yaml(&self) -> Result<String, GameError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
