use glam::Vec3;
use playground_scene::{Ground, SceneBackend};
use rand::Rng;
use tracing::{info, info_span, warn};

use crate::tree::{TreeMeshGroup, TreeParams, generate_tree};

/// Scatter `count` trees uniformly over the ground footprint, each root
/// standing at `(x, 0, z)`.
///
/// Trees may overlap. Trees that fail to build are skipped, so the result
/// can be shorter than `count`.
pub fn populate<B: SceneBackend, R: Rng>(
    scene: &mut B,
    ground: &Ground,
    count: usize,
    params: &TreeParams,
    rng: &mut R,
) -> Vec<TreeMeshGroup> {
    let span = info_span!("populate", count, width = ground.width, depth = ground.depth);
    let _enter = span.enter();

    let mut trees = Vec::with_capacity(count);
    for _ in 0..count {
        let x = rng.random::<f32>() * ground.width - ground.width / 2.0;
        let z = rng.random::<f32>() * ground.depth - ground.depth / 2.0;
        let Some(tree) = generate_tree(scene, params, x, z, rng) else {
            continue;
        };
        match scene.set_position(tree.root, Vec3::new(x, 0.0, z)) {
            Ok(()) => trees.push(tree),
            Err(err) => {
                warn!(x, z, error = %err, "could not place tree, skipping");
                scene.dispose(tree.root);
            }
        }
    }
    info!(planted = trees.len(), skipped = count - trees.len(), "terrain populated");
    trees
}
