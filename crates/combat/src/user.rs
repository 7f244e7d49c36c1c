use std::time::Duration;

use playground_common::NodeId;
use playground_scene::{CameraKind, SceneBackend, SceneError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CombatError;
use crate::weapon::{Shot, Weapon, WeaponKind};

/// Jump impulse shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Upward motion at the start of the jump.
    pub speed: f32,
    pub duration_ms: u64,
    /// How often [`User::tick`] is expected to run.
    pub tick_hz: u32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            duration_ms: 500,
            tick_hz: 60,
        }
    }
}

impl JumpConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

/// Upward motion `elapsed` into a jump: `speed * (1 - progress)` while
/// progress is below one, zero afterwards.
pub fn jump_velocity(elapsed: Duration, config: &JumpConfig) -> f32 {
    let duration = config.duration().as_secs_f32();
    if duration <= 0.0 {
        return 0.0;
    }
    let progress = elapsed.as_secs_f32() / duration;
    if progress < 1.0 {
        config.speed * (1.0 - progress)
    } else {
        0.0
    }
}

/// The player: a camera, an optional weapon and a jump in progress.
#[derive(Debug)]
pub struct User {
    camera: NodeId,
    weapon: Option<Weapon>,
    jump_started: Option<Duration>,
    jump: JumpConfig,
}

impl User {
    /// Wrap `camera` with a pre-built weapon mounted on the same camera.
    pub fn new<B: SceneBackend>(
        scene: &mut B,
        camera: NodeId,
        weapon: Weapon,
        jump: JumpConfig,
    ) -> Result<Self, CombatError> {
        if weapon.camera() != camera {
            return Err(CombatError::CameraMismatch {
                weapon: weapon.camera(),
                user: camera,
            });
        }
        let mut user = Self::unarmed(scene, camera, jump)?;
        user.weapon = Some(weapon);
        Ok(user)
    }

    /// Wrap `camera` and build its weapon with `factory`.
    pub fn with_factory<B, F>(scene: &mut B, camera: NodeId, factory: F, jump: JumpConfig) -> Result<Self, CombatError>
    where
        B: SceneBackend,
        F: FnOnce(&mut B, NodeId) -> Result<Weapon, CombatError>,
    {
        let mut user = Self::unarmed(scene, camera, jump)?;
        let weapon = factory(scene, camera)?;
        user.set_weapon(scene, weapon)?;
        Ok(user)
    }

    /// Wrap `camera` with a freshly built weapon of `kind`.
    pub fn equipped<B: SceneBackend>(
        scene: &mut B,
        camera: NodeId,
        kind: WeaponKind,
        jump: JumpConfig,
    ) -> Result<Self, CombatError> {
        Self::with_factory(scene, camera, |scene, camera| Weapon::new(scene, camera, kind), jump)
    }

    /// Wrap `camera` with no weapon. Gives the camera the input surface.
    pub fn unarmed<B: SceneBackend>(scene: &mut B, camera: NodeId, jump: JumpConfig) -> Result<Self, CombatError> {
        scene.attach_control(camera)?;
        Ok(Self {
            camera,
            weapon: None,
            jump_started: None,
            jump,
        })
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    pub fn jump_config(&self) -> &JumpConfig {
        &self.jump
    }

    pub fn is_jumping(&self) -> bool {
        self.jump_started.is_some()
    }

    /// Start a jump at `now`. Ignored while a jump is running and for
    /// cameras that are not physics-coupled. Returns whether a jump began.
    pub fn jump<B: SceneBackend>(&mut self, scene: &B, now: Duration) -> bool {
        if self.jump_started.is_some() {
            debug!("jump already in progress, ignoring");
            return false;
        }
        match scene.camera(self.camera) {
            Some(camera) if camera.kind == CameraKind::Universal => {
                self.jump_started = Some(now);
                debug!(at_ms = now.as_millis() as u64, "jump started");
                true
            }
            _ => false,
        }
    }

    /// Drive the running jump: write its upward motion into the camera,
    /// or finish it once the duration has passed.
    pub fn tick<B: SceneBackend>(&mut self, scene: &mut B, now: Duration) -> Result<(), CombatError> {
        let Some(started) = self.jump_started else {
            return Ok(());
        };
        let elapsed = now.saturating_sub(started);
        if elapsed >= self.jump.duration() {
            self.jump_started = None;
            debug!("jump finished");
            return Ok(());
        }
        let camera = scene
            .camera_mut(self.camera)
            .ok_or(SceneError::NotACamera(self.camera))?;
        camera.motion.y = jump_velocity(elapsed, &self.jump);
        Ok(())
    }

    /// Fire the equipped weapon. Without a weapon nothing happens.
    pub fn fire_weapon<B: SceneBackend, R: Rng>(&self, scene: &mut B, rng: &mut R) -> Result<Vec<Shot>, CombatError> {
        match &self.weapon {
            Some(weapon) => weapon.fire(scene, rng),
            None => Ok(Vec::new()),
        }
    }

    /// Equip `weapon`, disposing the one it replaces.
    pub fn set_weapon<B: SceneBackend>(&mut self, scene: &mut B, weapon: Weapon) -> Result<(), CombatError> {
        if weapon.camera() != self.camera {
            return Err(CombatError::CameraMismatch {
                weapon: weapon.camera(),
                user: self.camera,
            });
        }
        if let Some(previous) = self.weapon.replace(weapon) {
            previous.dispose(scene);
        }
        Ok(())
    }

    /// Release the weapon.
    pub fn dispose<B: SceneBackend>(self, scene: &mut B) {
        if let Some(weapon) = self.weapon {
            weapon.dispose(scene);
        }
    }
}
