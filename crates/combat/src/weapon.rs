use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use playground_common::{Color3, NodeId, Ray};
use playground_scene::{CylinderOptions, Material, MaterialId, PickInfo, SceneBackend, SceneError, SoundId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CombatError;

/// Muzzle position in camera space.
const MUZZLE_OFFSET: Vec3 = Vec3::new(1.0, -2.0, 5.0);
const MUZZLE_RENDERING_GROUP: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    LaserGun,
    Shotgun,
}

/// Fixed characteristics of a weapon kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub color: Color3,
    /// Width of the per-axis jitter added to the view direction.
    pub spread: f32,
    pub rays: usize,
    pub ray_length: f32,
    pub sound_name: &'static str,
    pub sound_path: &'static str,
    /// Play the cue for every ray instead of once per trigger pull.
    pub cue_per_ray: bool,
}

impl WeaponKind {
    pub const fn spec(self) -> WeaponSpec {
        match self {
            Self::LaserGun => WeaponSpec {
                color: Color3::new(1.0, 2.0, 1.0),
                spread: 0.01,
                rays: 1,
                ray_length: 2000.0,
                sound_name: "lasgunSound",
                sound_path: "sounds/lasgun.wav",
                cue_per_ray: false,
            },
            Self::Shotgun => WeaponSpec {
                color: Color3::new(1.0, 0.0, 0.0),
                spread: 0.15,
                rays: 8,
                ray_length: 50.0,
                sound_name: "shotgunSound",
                sound_path: "sounds/shotgun.wav",
                cue_per_ray: true,
            },
        }
    }
}

/// One ray cast by a weapon and what it hit, if anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub ray: Ray,
    pub hit: Option<PickInfo>,
}

/// `normalize(forward + jitter)` with jitter uniform in
/// `[-spread/2, spread/2)` on each axis.
///
/// The jitter is linear, not angular, so the cone is not uniform.
pub fn shot_direction<R: Rng>(forward: Vec3, spread: f32, rng: &mut R) -> Vec3 {
    let half = spread / 2.0;
    let jitter = if half > 0.0 {
        Vec3::new(
            rng.random_range(-half..half),
            rng.random_range(-half..half),
            rng.random_range(-half..half),
        )
    } else {
        Vec3::ZERO
    };
    (forward + jitter)
        .try_normalize()
        .or_else(|| forward.try_normalize())
        .unwrap_or(Vec3::Z)
}

/// A weapon mounted on a camera: a visible muzzle model plus a sound cue.
#[derive(Debug)]
pub struct Weapon {
    kind: WeaponKind,
    camera: NodeId,
    model: NodeId,
    material: MaterialId,
    sound: SoundId,
}

impl Weapon {
    /// Build the muzzle model under `camera` and load the cue.
    pub fn new<B: SceneBackend>(scene: &mut B, camera: NodeId, kind: WeaponKind) -> Result<Self, CombatError> {
        scene.camera(camera).ok_or(SceneError::NotACamera(camera))?;
        let spec = kind.spec();

        let model = scene.create_cylinder(
            "weaponModel",
            CylinderOptions {
                height: 3.0,
                diameter_top: 0.8,
                diameter_bottom: 0.9,
                tessellation: 64,
                subdivisions: 1,
            },
        );
        let material = scene.create_material(Material::new("weaponMaterial").with_diffuse(spec.color));
        let node = scene.node_mut(model).ok_or(SceneError::NodeNotFound(model))?;
        node.material = Some(material);
        node.rendering_group = MUZZLE_RENDERING_GROUP;
        node.pickable = false;
        node.transform.rotation = Quat::from_rotation_x(FRAC_PI_2);
        node.transform.position = MUZZLE_OFFSET;
        scene.set_parent(model, Some(camera))?;

        let sound = scene.load_sound(spec.sound_name, spec.sound_path);
        debug!(?kind, camera = %camera.short(), "weapon mounted");
        Ok(Self {
            kind,
            camera,
            model,
            material,
            sound,
        })
    }

    pub fn kind(&self) -> WeaponKind {
        self.kind
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn model(&self) -> NodeId {
        self.model
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    /// Pull the trigger: cast this kind's rays along the camera's view.
    pub fn fire<B: SceneBackend, R: Rng>(&self, scene: &mut B, rng: &mut R) -> Result<Vec<Shot>, CombatError> {
        let spec = self.kind.spec();
        let forward = scene
            .camera(self.camera)
            .ok_or(SceneError::NotACamera(self.camera))?
            .forward();

        let mut shots = Vec::with_capacity(spec.rays);
        for _ in 0..spec.rays {
            if spec.cue_per_ray {
                scene.play_sound(self.sound);
            }
            let direction = shot_direction(forward, spec.spread, rng);
            shots.push(self.shoot_ray(scene, direction, spec.ray_length)?);
        }
        if !spec.cue_per_ray {
            scene.play_sound(self.sound);
        }

        let hits = shots.iter().filter(|s| s.hit.is_some()).count();
        debug!(kind = ?self.kind, rays = shots.len(), hits, "fired");
        Ok(shots)
    }

    /// Cast one ray from the muzzle. The origin is sampled from a hidden
    /// clone of the model that is disposed before the pick returns.
    pub fn shoot_ray<B: SceneBackend>(&self, scene: &mut B, direction: Vec3, length: f32) -> Result<Shot, CombatError> {
        let sample = scene.clone_node(self.model, "tempWeaponModel")?;
        if let Some(node) = scene.node_mut(sample) {
            node.visible = false;
        }
        let origin = scene.absolute_position(sample);
        scene.dispose(sample);

        let origin = origin.ok_or(SceneError::NodeNotFound(sample))?;
        let ray = Ray::new(origin, direction, length)?;
        let hit = scene.pick_with_ray(&ray);
        Ok(Shot { ray, hit })
    }

    /// Release the muzzle model, its material and the sound.
    pub fn dispose<B: SceneBackend>(self, scene: &mut B) {
        scene.dispose(self.model);
        scene.dispose_material(self.material);
        scene.dispose_sound(self.sound);
        debug!(kind = ?self.kind, "weapon disposed");
    }
}
