//! World construction: procedural trees, terrain population and the
//! scene generator that assembles sky, light, ground and forest.
//!
//! # Invariants
//! - Vertices sharing an original position receive the same canopy offset.
//! - A tree is either fully built or not present at all.
//! - Randomness always comes from a caller-supplied [`rand::Rng`].

pub mod generator;
pub mod terrain;
pub mod tree;

pub use generator::{GeneratedWorld, SceneGenerator, WorldConfig};
pub use terrain::populate;
pub use tree::{TreeMeshGroup, TreeParams, VertexCluster, cluster_vertices, generate_tree, perturb};

use playground_input::InputError;
use playground_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("camera error: {0}")]
    Input(#[from] InputError),
}
