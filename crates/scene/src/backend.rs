use glam::Vec3;
use playground_common::{NodeId, Ray};

use crate::SceneError;
use crate::mesh::{CylinderOptions, SphereOptions, VertexKind};
use crate::node::{CameraKind, CameraState, Material, MaterialId, Node, SoundId};

/// Result of a successful ray pick: the nearest surface hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickInfo {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

/// The engine surface the gameplay core consumes.
///
/// Tree generation, weapons, camera strategies and the user are written
/// against this trait only. [`crate::Scene`] is the in-memory backend;
/// a GPU engine binding implements the same trait without changing callers.
pub trait SceneBackend {
    fn create_transform_node(&mut self, name: &str) -> NodeId;

    fn create_sphere(&mut self, name: &str, options: SphereOptions) -> NodeId;

    fn create_cylinder(&mut self, name: &str, options: CylinderOptions) -> NodeId;

    fn create_box(&mut self, name: &str, size: f32) -> NodeId;

    /// Create a camera node at `position`. The first camera becomes active.
    fn create_camera(&mut self, name: &str, kind: CameraKind, position: Vec3) -> NodeId;

    fn create_material(&mut self, material: Material) -> MaterialId;

    /// Release a material. Nodes still using it fall back to no material.
    fn dispose_material(&mut self, material: MaterialId);

    fn node(&self, id: NodeId) -> Option<&Node>;

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// Raw vertex buffer for a channel, or `None` if the node carries no geometry.
    fn vertex_data(&self, id: NodeId, kind: VertexKind) -> Option<&[f32]>;

    fn indices(&self, id: NodeId) -> Option<&[u32]>;

    fn set_vertex_data(&mut self, id: NodeId, kind: VertexKind, data: Vec<f32>) -> Result<(), SceneError>;

    fn convert_to_flat_shaded(&mut self, id: NodeId) -> Result<(), SceneError>;

    fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError>;

    /// Copy a node (not its children) under the same parent.
    fn clone_node(&mut self, id: NodeId, name: &str) -> Result<NodeId, SceneError>;

    /// World-space position after walking the parent chain.
    fn absolute_position(&self, id: NodeId) -> Option<Vec3>;

    /// Nearest hit among visible, enabled, pickable meshes.
    fn pick_with_ray(&mut self, ray: &Ray) -> Option<PickInfo>;

    /// Remove a node and all of its descendants.
    fn dispose(&mut self, id: NodeId);

    /// Register a sound. A missing file is logged and yields a silent sound.
    fn load_sound(&mut self, name: &str, path: &str) -> SoundId;

    fn play_sound(&mut self, sound: SoundId);

    fn dispose_sound(&mut self, sound: SoundId);

    /// Give `camera` the input surface. Any previously attached camera is detached.
    fn attach_control(&mut self, camera: NodeId) -> Result<(), SceneError>;

    fn camera(&self, id: NodeId) -> Option<&CameraState> {
        self.node(id).and_then(Node::camera)
    }

    fn camera_mut(&mut self, id: NodeId) -> Option<&mut CameraState> {
        self.node_mut(id).and_then(Node::camera_mut)
    }

    fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        let node = self.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.transform.position = position;
        Ok(())
    }
}
