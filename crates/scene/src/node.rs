use glam::{EulerRot, Mat4, Quat, Vec3};
use playground_common::{Color3, Key, NodeId, Transform};
use serde::{Deserialize, Serialize};

use crate::mesh::MeshData;

/// Handle to a material registered with a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

/// Handle to a sound registered with a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundId(pub u64);

/// Where a material's texture comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    /// Image file, path relative to the asset root.
    File(String),
    /// Six-face cube texture sharing a base path (`<base>_px.jpg`, ...).
    Cube(String),
    /// Procedurally generated wood grain.
    ProceduralWood { size: u32, amp_scale: f32 },
}

/// Standard surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub diffuse_color: Color3,
    pub specular_color: Color3,
    pub diffuse_texture: Option<TextureSource>,
    pub reflection_texture: Option<TextureSource>,
    pub back_face_culling: bool,
    pub disable_lighting: bool,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: Color3::WHITE,
            specular_color: Color3::WHITE,
            diffuse_texture: None,
            reflection_texture: None,
            back_face_culling: true,
            disable_lighting: false,
        }
    }

    pub fn with_diffuse(mut self, color: Color3) -> Self {
        self.diffuse_color = color;
        self
    }
}

/// Camera flavour. Universal cameras take part in gravity and collisions
/// when their flags are set; free cameras are never physics-coupled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraKind {
    Universal,
    Free,
}

/// Keys that drive camera movement. Defaults to the arrow keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementKeys {
    pub up: Vec<Key>,
    pub down: Vec<Key>,
    pub left: Vec<Key>,
    pub right: Vec<Key>,
}

impl Default for MovementKeys {
    fn default() -> Self {
        Self {
            up: vec![Key::ArrowUp],
            down: vec![Key::ArrowDown],
            left: vec![Key::ArrowLeft],
            right: vec![Key::ArrowRight],
        }
    }
}

/// Camera-specific state carried by a camera node.
///
/// Orientation is yaw/pitch with local `+Z` as the view axis: children
/// placed at positive local Z sit in front of the lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub kind: CameraKind,
    pub yaw: f32,
    pub pitch: f32,
    pub apply_gravity: bool,
    pub check_collisions: bool,
    pub ellipsoid: Vec3,
    pub keys: MovementKeys,
    /// Per-frame motion vector, consumed and decayed by the scene each frame.
    pub motion: Vec3,
    pub speed: f32,
    pub inertia: f32,
    pub angular_sensibility: f32,
}

impl CameraState {
    pub fn new(kind: CameraKind) -> Self {
        Self {
            kind,
            yaw: 0.0,
            pitch: 0.0,
            apply_gravity: false,
            check_collisions: false,
            ellipsoid: Vec3::new(0.5, 1.0, 0.5),
            keys: MovementKeys::default(),
            motion: Vec3::ZERO,
            speed: 2.0,
            inertia: 0.9,
            angular_sensibility: 2000.0,
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    /// Aim from `position` at `target`. A target equal to the position
    /// leaves the orientation untouched.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        let Some(dir) = (target - position).try_normalize() else {
            return;
        };
        self.yaw = dir.x.atan2(dir.z);
        self.pitch = (-dir.y).clamp(-1.0, 1.0).asin();
    }

    /// Apply a pointer delta in screen pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx / self.angular_sensibility;
        self.pitch = (self.pitch + dy / self.angular_sensibility)
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }
}

/// Light flavours the playground uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Hemispheric { direction: Vec3, intensity: f32 },
    Point { intensity: f32 },
}

/// What a node is, beyond its transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Grouping node with no geometry of its own.
    Transform,
    /// Renderable geometry. `None` once the geometry has been released.
    Mesh(Option<MeshData>),
    Camera(CameraState),
    Light(Light),
}

/// One node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub material: Option<MaterialId>,
    pub visible: bool,
    pub enabled: bool,
    pub pickable: bool,
    pub check_collisions: bool,
    pub rendering_group: u8,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            parent: None,
            material: None,
            visible: true,
            enabled: true,
            pickable: true,
            check_collisions: false,
            rendering_group: 0,
        }
    }

    pub fn geometry(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(geometry) => geometry.as_ref(),
            _ => None,
        }
    }

    pub fn geometry_mut(&mut self) -> Option<&mut MeshData> {
        match &mut self.kind {
            NodeKind::Mesh(geometry) => geometry.as_mut(),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&CameraState> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraState> {
        match &mut self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Local-to-parent matrix. Cameras take their rotation from yaw/pitch.
    pub fn local_matrix(&self) -> Mat4 {
        match &self.kind {
            NodeKind::Camera(camera) => Mat4::from_scale_rotation_translation(
                self.transform.scale,
                camera.orientation(),
                self.transform.position,
            ),
            _ => self.transform.matrix(),
        }
    }
}
