//! Scene: the engine boundary the gameplay core talks to, plus an
//! in-memory scene graph implementing it.
//!
//! # Invariants
//! - Gameplay code reaches the engine only through [`SceneBackend`].
//! - Every ray cast, sound cue and node lifecycle change is logged as a [`SceneEvent`];
//!   the log keeps the most recent [`EVENT_LOG_CAPACITY`] entries.
//! - At most one camera holds the input attachment.
//!
//! # Workaround
//! The in-memory [`Scene`] stands in for a GPU engine: it keeps geometry on
//! the CPU, picks by brute force behind a bounding-sphere cull and treats
//! gravity and collisions as a per-frame ground clamp.

mod animation;
mod backend;
mod heightmap;
mod mesh;
mod node;
mod scene;

pub use animation::{AnimatedProperty, Animation, AnimationKey};
pub use backend::{PickInfo, SceneBackend};
pub use heightmap::Heightmap;
pub use mesh::{CylinderOptions, MeshData, SphereOptions, VertexKind, compute_normals};
pub use node::{
    CameraKind, CameraState, Light, Material, MaterialId, MovementKeys, Node, NodeKind, SoundId,
    TextureSource,
};
pub use scene::{EVENT_LOG_CAPACITY, Fog, Ground, GroundOptions, Scene, SceneEvent, SceneSettings};

use playground_common::NodeId;

/// Errors from scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no geometry")]
    NoGeometry(NodeId),
    #[error("node {0:?} is not a camera")]
    NotACamera(NodeId),
    #[error("vertex buffer length {0} is not a multiple of 3")]
    InvalidVertexData(usize),
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    ParentCycle { child: NodeId, parent: NodeId },
    #[error("asset not found: {0}")]
    AssetNotFound(String),
    #[error("heightmap error: {0}")]
    Heightmap(#[from] image::ImageError),
    #[error("no active camera")]
    NoActiveCamera,
}
