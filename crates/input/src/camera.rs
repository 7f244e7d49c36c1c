use glam::Vec3;
use playground_common::{Key, NodeId};
use playground_scene::{CameraKind, SceneBackend, SceneError};

use crate::InputError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const COLLIDER_START: Vec3 = Vec3::new(0.0, 10.0, -25.0);
const COLLIDER_ELLIPSOID: Vec3 = Vec3::new(1.0, 3.0, 1.0);
const FREE_START: Vec3 = Vec3::new(0.0, 2.0, -25.0);

/// How the player's viewpoint is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStrategy {
    /// First-person collider: gravity, ellipsoid collisions, WASD plus
    /// arrows, attached to the input surface.
    #[default]
    Universal,
    /// Free-fly viewpoint with no physics coupling.
    Free,
}

impl CameraStrategy {
    pub fn create_camera<B: SceneBackend + ?Sized>(&self, scene: &mut B) -> Result<NodeId, InputError> {
        match self {
            Self::Universal => {
                let id = scene.create_camera("UniversalCamera", CameraKind::Universal, COLLIDER_START);
                let camera = scene.camera_mut(id).ok_or(SceneError::NotACamera(id))?;
                camera.look_at(COLLIDER_START, Vec3::ZERO);
                camera.apply_gravity = true;
                camera.ellipsoid = COLLIDER_ELLIPSOID;
                camera.check_collisions = true;
                camera.keys.up.push(Key::W);
                camera.keys.down.push(Key::S);
                camera.keys.left.push(Key::A);
                camera.keys.right.push(Key::D);
                scene.attach_control(id)?;
                debug!(camera = %id.short(), "collider camera ready");
                Ok(id)
            }
            Self::Free => Ok(scene.create_camera("FreeCamera", CameraKind::Free, FREE_START)),
        }
    }
}
