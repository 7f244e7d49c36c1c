use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::PathBuf;

use glam::{Mat4, Vec3};
use playground_common::{Color3, Key, NodeId, Ray};
use tracing::{debug, warn};

use crate::SceneError;
use crate::animation::{Animation, Playback};
use crate::backend::{PickInfo, SceneBackend};
use crate::heightmap::Heightmap;
use crate::mesh::{CylinderOptions, MeshData, SphereOptions, VertexKind};
use crate::node::{CameraKind, CameraState, Light, Material, MaterialId, Node, NodeKind, SoundId, TextureSource};

/// Parent chains deeper than this are treated as broken.
const MAX_PARENT_DEPTH: usize = 64;

/// Events kept before the oldest are discarded.
pub const EVENT_LOG_CAPACITY: usize = 4096;

/// Faces of a cube texture, appended to its base path.
const CUBE_FACES: [&str; 6] = ["_px.jpg", "_py.jpg", "_pz.jpg", "_nx.jpg", "_ny.jpg", "_nz.jpg"];

/// A record of every observable mutation or query on the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeCreated { id: NodeId, name: String },
    NodeDisposed { id: NodeId },
    RayCast {
        origin: Vec3,
        direction: Vec3,
        length: f32,
        hit: Option<NodeId>,
    },
    SoundPlayed { sound: SoundId, audible: bool },
    AssetMissing { path: String },
    ControlAttached { camera: NodeId },
}

/// Exponential fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub density: f32,
    pub color: Color3,
}

/// Scene-wide simulation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    /// Displacement added each frame to cameras with gravity enabled.
    pub gravity: Vec3,
    pub collisions_enabled: bool,
    pub physics_enabled: bool,
    pub fog: Option<Fog>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            collisions_enabled: false,
            physics_enabled: false,
            fog: None,
        }
    }
}

/// Ground-from-heightmap parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundOptions {
    pub width: f32,
    pub depth: f32,
    pub subdivisions: u32,
    pub min_height: f32,
    pub max_height: f32,
}

/// A ground mesh and its footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    pub node: NodeId,
    pub width: f32,
    pub depth: f32,
}

#[derive(Debug, Clone)]
struct Sound {
    name: String,
    audible: bool,
}

/// In-memory scene graph and the reference [`SceneBackend`].
///
/// Nodes are kept in a BTreeMap so iteration, picking ties and debug
/// output are stable. Every creation, disposal, ray cast and sound is
/// appended to an event log holding at most [`EVENT_LOG_CAPACITY`] entries.
#[derive(Debug)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    materials: BTreeMap<MaterialId, Material>,
    sounds: BTreeMap<SoundId, Sound>,
    next_handle: u64,
    pub settings: SceneSettings,
    asset_root: PathBuf,
    attached_camera: Option<NodeId>,
    active_camera: Option<NodeId>,
    held_keys: HashSet<Key>,
    playbacks: Vec<Playback>,
    frame: u64,
    events: VecDeque<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene resolving assets against the working directory.
    pub fn new() -> Self {
        Self::with_asset_root(".")
    }

    pub fn with_asset_root(root: impl Into<PathBuf>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            materials: BTreeMap::new(),
            sounds: BTreeMap::new(),
            next_handle: 0,
            settings: SceneSettings::default(),
            asset_root: root.into(),
            attached_camera: None,
            active_camera: None,
            held_keys: HashSet::new(),
            playbacks: Vec::new(),
            frame: 0,
            events: VecDeque::new(),
        }
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    pub fn sound_name(&self, id: SoundId) -> Option<&str> {
        self.sounds.get(&id).map(|s| s.name.as_str())
    }

    /// Recent events, oldest first.
    pub fn events(&self) -> &VecDeque<SceneEvent> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    fn record(&mut self, event: SceneEvent) {
        if self.events.len() == EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn active_camera(&self) -> Option<NodeId> {
        self.active_camera
    }

    pub fn set_active_camera(&mut self, camera: NodeId) -> Result<(), SceneError> {
        self.camera(camera).ok_or(SceneError::NotACamera(camera))?;
        self.active_camera = Some(camera);
        Ok(())
    }

    pub fn attached_camera(&self) -> Option<NodeId> {
        self.attached_camera
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Resolve an asset path (a leading `./` is ignored) against the asset root.
    pub fn resolve_asset(&mut self, path: &str) -> Result<PathBuf, SceneError> {
        let full = self.asset_root.join(path.trim_start_matches("./"));
        if full.exists() {
            Ok(full)
        } else {
            self.record(SceneEvent::AssetMissing {
                path: path.to_string(),
            });
            Err(SceneError::AssetNotFound(path.to_string()))
        }
    }

    pub fn load_texture(&mut self, path: &str) -> Result<TextureSource, SceneError> {
        self.resolve_asset(path)?;
        Ok(TextureSource::File(path.to_string()))
    }

    /// Check all six faces of a cube texture exist under `base`.
    pub fn load_cube_texture(&mut self, base: &str) -> Result<TextureSource, SceneError> {
        for face in CUBE_FACES {
            self.resolve_asset(&format!("{base}{face}"))?;
        }
        Ok(TextureSource::Cube(base.to_string()))
    }

    /// Build a ground grid displaced by a heightmap image. A missing or
    /// unreadable heightmap is logged and produces a flat ground at height 0.
    pub fn create_ground_from_heightmap(&mut self, name: &str, path: &str, options: GroundOptions) -> Ground {
        let heightmap = self
            .resolve_asset(path)
            .and_then(|full| Heightmap::load(&full));
        let geometry = match heightmap {
            Ok(map) => {
                let range = options.max_height - options.min_height;
                MeshData::ground(options.width, options.depth, options.subdivisions, |u, v| {
                    options.min_height + range * map.sample(u, v)
                })
            }
            Err(err) => {
                warn!(path, error = %err, "heightmap unavailable, using flat ground");
                MeshData::ground(options.width, options.depth, options.subdivisions, |_, _| 0.0)
            }
        };
        let node = self.insert(Node::new(name, NodeKind::Mesh(Some(geometry))));
        Ground {
            node,
            width: options.width,
            depth: options.depth,
        }
    }

    pub fn create_hemispheric_light(&mut self, name: &str, direction: Vec3, intensity: f32) -> NodeId {
        self.insert(Node::new(
            name,
            NodeKind::Light(Light::Hemispheric { direction, intensity }),
        ))
    }

    pub fn create_point_light(&mut self, name: &str, position: Vec3, intensity: f32) -> NodeId {
        let mut node = Node::new(name, NodeKind::Light(Light::Point { intensity }));
        node.transform.position = position;
        self.insert(node)
    }

    /// Play `animation` on `target` from frame `from` to `to`.
    pub fn begin_animation(
        &mut self,
        target: NodeId,
        animation: Animation,
        from: f32,
        to: f32,
        looping: bool,
    ) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&target) {
            return Err(SceneError::NodeNotFound(target));
        }
        self.playbacks.push(Playback {
            target,
            animation,
            from,
            to,
            looping,
            frame: from,
        });
        Ok(())
    }

    pub fn animation_count(&self) -> usize {
        self.playbacks.len()
    }

    pub fn key_down(&mut self, key: Key) {
        self.held_keys.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held_keys.remove(&key);
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.local_matrix();
        for _ in 0..MAX_PARENT_DEPTH {
            let Some(parent) = node.parent else {
                return Some(matrix);
            };
            node = self.nodes.get(&parent)?;
            matrix = node.local_matrix() * matrix;
        }
        None
    }

    /// Nearest hit among meshes accepted by `predicate`, without logging.
    pub fn pick_with_predicate(&self, ray: &Ray, predicate: impl Fn(&Node) -> bool) -> Option<PickInfo> {
        let mut best: Option<PickInfo> = None;
        for (id, node) in &self.nodes {
            let Some(geometry) = node.geometry() else {
                continue;
            };
            if !predicate(node) {
                continue;
            }
            let Some(world) = self.world_matrix(*id) else {
                continue;
            };
            let (center, radius) = geometry.bounding_sphere();
            let max_scale = world
                .x_axis
                .truncate()
                .length()
                .max(world.y_axis.truncate().length())
                .max(world.z_axis.truncate().length());
            if !ray.intersects_sphere(world.transform_point3(center), radius * max_scale) {
                continue;
            }
            for [a, b, c] in geometry.triangles() {
                let hit = ray.intersect_triangle(
                    world.transform_point3(a),
                    world.transform_point3(b),
                    world.transform_point3(c),
                );
                if let Some(distance) = hit {
                    if best.is_none_or(|b| distance < b.distance) {
                        best = Some(PickInfo {
                            node: *id,
                            distance,
                            point: ray.at(distance),
                        });
                    }
                }
            }
        }
        best
    }

    /// Advance one frame: move cameras and step animations.
    ///
    /// Fails when no camera is active, matching the engine refusing to
    /// draw without a viewpoint.
    pub fn render(&mut self, dt: f32) -> Result<(), SceneError> {
        if self.active_camera.is_none() {
            return Err(SceneError::NoActiveCamera);
        }
        self.frame += 1;
        self.update_cameras(dt);
        self.update_animations(dt);
        Ok(())
    }

    /// Release every node, material and sound.
    pub fn dispose_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            if self.nodes.remove(&id).is_some() {
                self.record(SceneEvent::NodeDisposed { id });
            }
        }
        self.materials.clear();
        self.sounds.clear();
        self.playbacks.clear();
        self.attached_camera = None;
        self.active_camera = None;
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        self.record(SceneEvent::NodeCreated {
            id,
            name: node.name.clone(),
        });
        self.nodes.insert(id, node);
        id
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        for _ in 0..MAX_PARENT_DEPTH {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
        false
    }

    fn key_direction(&self, camera: &CameraState) -> Vec3 {
        let mut local = Vec3::ZERO;
        for key in &self.held_keys {
            if camera.keys.up.contains(key) {
                local.z += 1.0;
            }
            if camera.keys.down.contains(key) {
                local.z -= 1.0;
            }
            if camera.keys.left.contains(key) {
                local.x -= 1.0;
            }
            if camera.keys.right.contains(key) {
                local.x += 1.0;
            }
        }
        camera.forward() * local.z + camera.right() * local.x
    }

    /// Highest collidable surface under `position`, probing from `reach` above it.
    fn floor_below(&self, position: Vec3, reach: f32) -> Option<f32> {
        let origin = position + Vec3::Y * reach;
        let ray = Ray::new(origin, Vec3::NEG_Y, 10_000.0).ok()?;
        self.pick_with_predicate(&ray, |node| node.check_collisions && node.enabled)
            .map(|hit| hit.point.y)
    }

    /// Whether a horizontal step would bring the ellipsoid into a collidable surface.
    fn blocked_ahead(&self, position: Vec3, step: Vec3, radius: f32) -> bool {
        let distance = step.length();
        if distance <= f32::EPSILON {
            return false;
        }
        let Ok(ray) = Ray::new(position, step / distance, distance + radius) else {
            return false;
        };
        self.pick_with_predicate(&ray, |node| node.check_collisions && node.enabled)
            .is_some()
    }

    fn update_cameras(&mut self, dt: f32) {
        let cameras: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.camera().is_some())
            .map(|(id, _)| *id)
            .collect();

        for id in cameras {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let Some(camera) = node.camera() else {
                continue;
            };

            let mut motion = camera.motion;
            if self.attached_camera == Some(id) {
                motion += self.key_direction(camera) * camera.speed * dt;
            }
            let mut displacement = motion;
            if camera.kind == CameraKind::Universal && camera.apply_gravity {
                displacement += self.settings.gravity;
            }
            if camera.check_collisions && self.settings.collisions_enabled {
                let horizontal = Vec3::new(displacement.x, 0.0, displacement.z);
                if self.blocked_ahead(node.transform.position, horizontal, camera.ellipsoid.x) {
                    displacement.x = 0.0;
                    displacement.z = 0.0;
                    motion.x = 0.0;
                    motion.z = 0.0;
                }
            }
            let mut position = node.transform.position + displacement;

            if camera.check_collisions && self.settings.collisions_enabled {
                let reach = camera.ellipsoid.y * 2.0;
                if let Some(floor) = self.floor_below(position, reach) {
                    let min_y = floor + camera.ellipsoid.y;
                    if position.y < min_y {
                        position.y = min_y;
                        motion.y = motion.y.max(0.0);
                    }
                }
            }

            motion *= camera.inertia;
            if motion.length_squared() < 1e-8 {
                motion = Vec3::ZERO;
            }

            if let Some(node) = self.nodes.get_mut(&id) {
                node.transform.position = position;
                if let Some(camera) = node.camera_mut() {
                    camera.motion = motion;
                }
            }
        }
    }

    fn update_animations(&mut self, dt: f32) {
        let nodes = &mut self.nodes;
        self.playbacks.retain_mut(|playback| match nodes.get_mut(&playback.target) {
            Some(node) => playback.advance(node, dt),
            None => false,
        });
    }
}

impl SceneBackend for Scene {
    fn create_transform_node(&mut self, name: &str) -> NodeId {
        self.insert(Node::new(name, NodeKind::Transform))
    }

    fn create_sphere(&mut self, name: &str, options: SphereOptions) -> NodeId {
        let geometry = MeshData::sphere(&options);
        self.insert(Node::new(name, NodeKind::Mesh(Some(geometry))))
    }

    fn create_cylinder(&mut self, name: &str, options: CylinderOptions) -> NodeId {
        let geometry = MeshData::cylinder(&options);
        self.insert(Node::new(name, NodeKind::Mesh(Some(geometry))))
    }

    fn create_box(&mut self, name: &str, size: f32) -> NodeId {
        let geometry = MeshData::cuboid(size);
        self.insert(Node::new(name, NodeKind::Mesh(Some(geometry))))
    }

    fn create_camera(&mut self, name: &str, kind: CameraKind, position: Vec3) -> NodeId {
        let mut node = Node::new(name, NodeKind::Camera(CameraState::new(kind)));
        node.transform.position = position;
        let id = self.insert(node);
        if self.active_camera.is_none() {
            self.active_camera = Some(id);
        }
        id
    }

    fn create_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next_handle());
        self.materials.insert(id, material);
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn vertex_data(&self, id: NodeId, kind: VertexKind) -> Option<&[f32]> {
        self.nodes
            .get(&id)
            .and_then(Node::geometry)
            .map(|g| g.channel(kind))
    }

    fn indices(&self, id: NodeId) -> Option<&[u32]> {
        self.nodes
            .get(&id)
            .and_then(Node::geometry)
            .map(|g| g.indices.as_slice())
    }

    fn set_vertex_data(&mut self, id: NodeId, kind: VertexKind, data: Vec<f32>) -> Result<(), SceneError> {
        if data.len() % 3 != 0 {
            return Err(SceneError::InvalidVertexData(data.len()));
        }
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let geometry = node.geometry_mut().ok_or(SceneError::NoGeometry(id))?;
        match kind {
            VertexKind::Position => geometry.positions = data,
            VertexKind::Normal => geometry.normals = data,
        }
        Ok(())
    }

    fn convert_to_flat_shaded(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        let geometry = node.geometry_mut().ok_or(SceneError::NoGeometry(id))?;
        *geometry = geometry.to_flat_shaded();
        Ok(())
    }

    fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
            if self.is_ancestor(child, parent) {
                return Err(SceneError::ParentCycle { child, parent });
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        Ok(())
    }

    fn clone_node(&mut self, id: NodeId, name: &str) -> Result<NodeId, SceneError> {
        let mut copy = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?.clone();
        copy.name = name.to_string();
        Ok(self.insert(copy))
    }

    fn absolute_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    fn pick_with_ray(&mut self, ray: &Ray) -> Option<PickInfo> {
        let hit = self.pick_with_predicate(ray, |node| node.visible && node.enabled && node.pickable);
        debug!(
            origin = ?ray.origin(),
            direction = ?ray.direction(),
            length = ray.length(),
            hit = ?hit.map(|h| h.node.short()),
            "ray pick"
        );
        self.record(SceneEvent::RayCast {
            origin: ray.origin(),
            direction: ray.direction(),
            length: ray.length(),
            hit: hit.map(|h| h.node),
        });
        hit
    }

    fn dispose(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|candidate| self.is_ancestor(id, *candidate))
            .collect();
        for doomed_id in doomed {
            self.nodes.remove(&doomed_id);
            self.record(SceneEvent::NodeDisposed { id: doomed_id });
            if self.attached_camera == Some(doomed_id) {
                self.attached_camera = None;
            }
            if self.active_camera == Some(doomed_id) {
                self.active_camera = None;
            }
        }
        let nodes = &self.nodes;
        self.playbacks.retain(|p| nodes.contains_key(&p.target));
    }

    fn load_sound(&mut self, name: &str, path: &str) -> SoundId {
        let audible = match self.resolve_asset(path) {
            Ok(_) => true,
            Err(err) => {
                warn!(name, error = %err, "sound unavailable, cue will be silent");
                false
            }
        };
        let id = SoundId(self.next_handle());
        self.sounds.insert(
            id,
            Sound {
                name: name.to_string(),
                audible,
            },
        );
        id
    }

    fn play_sound(&mut self, sound: SoundId) {
        if let Some(audible) = self.sounds.get(&sound).map(|s| s.audible) {
            self.record(SceneEvent::SoundPlayed { sound, audible });
        }
    }

    fn dispose_sound(&mut self, sound: SoundId) {
        self.sounds.remove(&sound);
    }

    fn dispose_material(&mut self, material: MaterialId) {
        if self.materials.remove(&material).is_some() {
            for node in self.nodes.values_mut().filter(|n| n.material == Some(material)) {
                node.material = None;
            }
        }
    }

    fn attach_control(&mut self, camera: NodeId) -> Result<(), SceneError> {
        self.camera(camera).ok_or(SceneError::NotACamera(camera))?;
        if let Some(previous) = self.attached_camera.filter(|c| *c != camera) {
            debug!(camera = %previous.short(), "detaching control");
        }
        self.attached_camera = Some(camera);
        self.record(SceneEvent::ControlAttached { camera });
        Ok(())
    }
}
