use std::f32::consts::PI;

use glam::Vec3;
use playground_common::{Color3, NodeId};
use playground_input::CameraStrategy;
use playground_scene::{
    AnimatedProperty, Animation, AnimationKey, Fog, Ground, GroundOptions, Material, Scene, SceneBackend,
    SceneError,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::WorldError;
use crate::terrain::populate;
use crate::tree::{TreeMeshGroup, TreeParams};

const BORDER_DISTANCE: f32 = 100.0;
const BORDER_HEIGHT: f32 = 100.0;

/// World construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Displacement applied each frame to gravity-bound cameras.
    pub gravity: Vec3,
    pub ground_size: f32,
    pub ground_subdivisions: u32,
    pub min_height: f32,
    pub max_height: f32,
    pub heightmap: String,
    pub grass_texture: String,
    pub skybox_texture: String,
    pub skybox_size: f32,
    pub tree_count: usize,
    pub tree: TreeParams,
    pub fog: bool,
    pub borders: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -0.75, 0.0),
            ground_size: 1000.0,
            ground_subdivisions: 100,
            min_height: -50.0,
            max_height: 5.0,
            heightmap: "textures/heightMap.png".into(),
            grass_texture: "textures/grass.png".into(),
            skybox_texture: "textures/skybox".into(),
            skybox_size: 1000.0,
            tree_count: 50,
            tree: TreeParams::default(),
            fog: false,
            borders: false,
        }
    }
}

/// What [`SceneGenerator::generate`] built.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorld {
    pub ground: Ground,
    pub skybox: NodeId,
    pub trees: Vec<TreeMeshGroup>,
    pub borders: Vec<NodeId>,
}

/// Owns the scene and the player camera while the world is assembled.
pub struct SceneGenerator {
    scene: Scene,
    camera: NodeId,
    config: WorldConfig,
}

impl SceneGenerator {
    /// Create the camera through `strategy` in `scene`.
    pub fn new(mut scene: Scene, strategy: CameraStrategy, config: WorldConfig) -> Result<Self, WorldError> {
        let camera = strategy.create_camera(&mut scene)?;
        Ok(Self { scene, camera, config })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Scene, NodeId) {
        (self.scene, self.camera)
    }

    /// Build settings, sky, lights, animations, ground and the forest.
    pub fn generate<R: Rng>(&mut self, rng: &mut R) -> Result<GeneratedWorld, WorldError> {
        let span = info_span!("generate_world", trees = self.config.tree_count);
        let _enter = span.enter();

        self.scene.settings.gravity = self.config.gravity;
        self.scene.settings.collisions_enabled = true;
        self.scene.settings.physics_enabled = true;

        let skybox = self.create_skybox()?;
        if self.config.fog {
            self.scene.settings.fog = Some(Fog {
                density: 0.005,
                color: Color3::new(0.9, 0.9, 0.85),
            });
        }
        self.create_lighting();
        self.create_animations()?;
        let borders = if self.config.borders {
            self.create_borders()?
        } else {
            Vec::new()
        };
        let ground = self.create_ground()?;
        let trees = populate(&mut self.scene, &ground, self.config.tree_count, &self.config.tree, rng);

        info!(
            nodes = self.scene.node_count(),
            trees = trees.len(),
            camera = %self.camera.short(),
            "world generated"
        );
        Ok(GeneratedWorld {
            ground,
            skybox,
            trees,
            borders,
        })
    }

    fn create_skybox(&mut self) -> Result<NodeId, SceneError> {
        let skybox = self.scene.create_box("skybox", self.config.skybox_size);
        let mut material = Material::new("skybox");
        material.back_face_culling = false;
        material.diffuse_color = Color3::BLACK;
        material.specular_color = Color3::BLACK;
        material.disable_lighting = true;
        match self.scene.load_cube_texture(&self.config.skybox_texture) {
            Ok(texture) => {
                debug!("skybox textures loaded");
                material.reflection_texture = Some(texture);
            }
            Err(err) => warn!(error = %err, "skybox textures unavailable"),
        }
        let material = self.scene.create_material(material);
        let node = self.scene.node_mut(skybox).ok_or(SceneError::NodeNotFound(skybox))?;
        node.material = Some(material);
        node.pickable = false;
        Ok(skybox)
    }

    fn create_lighting(&mut self) {
        self.scene
            .create_hemispheric_light("light1", Vec3::new(1.0, 1.0, 0.0), 0.5);
        self.scene
            .create_point_light("light2", Vec3::new(60.0, 60.0, 0.0), 0.5);
    }

    fn create_animations(&mut self) -> Result<(), SceneError> {
        let Some(target) = self.scene.find_by_name("box") else {
            debug!("no mesh named box, rotation animation skipped");
            return Ok(());
        };
        let animation = Animation {
            name: "boxRotation".into(),
            property: AnimatedProperty::RotationY,
            frames_per_second: 30.0,
            keys: vec![
                AnimationKey { frame: 0.0, value: 0.0 },
                AnimationKey { frame: 50.0, value: PI },
                AnimationKey { frame: 100.0, value: 0.0 },
            ],
        };
        self.scene.begin_animation(target, animation, 0.0, 100.0, true)
    }

    fn create_ground(&mut self) -> Result<Ground, SceneError> {
        let ground = self.scene.create_ground_from_heightmap(
            "ground",
            &self.config.heightmap,
            GroundOptions {
                width: self.config.ground_size,
                depth: self.config.ground_size,
                subdivisions: self.config.ground_subdivisions,
                min_height: self.config.min_height,
                max_height: self.config.max_height,
            },
        );
        let mut material = Material::new("ground");
        material.specular_color = Color3::BLACK;
        match self.scene.load_texture(&self.config.grass_texture) {
            Ok(texture) => material.diffuse_texture = Some(texture),
            Err(err) => warn!(error = %err, "grass texture unavailable"),
        }
        let material = self.scene.create_material(material);
        let node = self
            .scene
            .node_mut(ground.node)
            .ok_or(SceneError::NodeNotFound(ground.node))?;
        node.material = Some(material);
        node.check_collisions = true;
        Ok(ground)
    }

    /// Four invisible collidable walls boxing in the play area.
    fn create_borders(&mut self) -> Result<Vec<NodeId>, SceneError> {
        let span = BORDER_DISTANCE * 2.0;
        let walls = [
            (Vec3::new(-BORDER_DISTANCE, 0.0, 0.0), Vec3::new(1.0, BORDER_HEIGHT, span)),
            (Vec3::new(BORDER_DISTANCE, 0.0, 0.0), Vec3::new(1.0, BORDER_HEIGHT, span)),
            (Vec3::new(0.0, 0.0, BORDER_DISTANCE), Vec3::new(span, BORDER_HEIGHT, 1.0)),
            (Vec3::new(0.0, 0.0, -BORDER_DISTANCE), Vec3::new(span, BORDER_HEIGHT, 1.0)),
        ];
        let mut ids = Vec::with_capacity(walls.len());
        for (index, (position, scale)) in walls.into_iter().enumerate() {
            let id = self.scene.create_box(&format!("border{index}"), 1.0);
            let node = self.scene.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
            node.transform.position = position;
            node.transform.scale = scale;
            node.check_collisions = true;
            node.visible = false;
            ids.push(id);
        }
        Ok(ids)
    }
}
