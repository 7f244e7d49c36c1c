use glam::Vec3;
use playground_common::{Color3, NodeId};
use playground_scene::{
    CylinderOptions, Material, MaterialId, SceneBackend, SceneError, SphereOptions, TextureSource,
    VertexKind, compute_normals,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Squared distance under which two canopy vertices count as one point.
const CLUSTER_EPSILON_SQ: f32 = 0.01;
const CANOPY_SEGMENTS: u32 = 2;
const TRUNK_TESSELLATION: u32 = 10;
const TRUNK_SUBDIVISIONS: u32 = 2;
const LEAF_COLOR: Color3 = Color3::new(0.5, 1.0, 0.5);
const WOOD_TEXTURE_SIZE: u32 = 512;
const WOOD_AMP_SCALE: f32 = 50.0;

/// Size parameters for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub canopy_diameter: f32,
    pub trunk_height: f32,
    /// Bottom diameter of the trunk; the top tapers to `max(base - 2, 1)`.
    pub trunk_base_radius: f32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            canopy_diameter: 25.0,
            trunk_height: 35.0,
            trunk_base_radius: 10.0,
        }
    }
}

impl TreeParams {
    pub fn trunk_top_diameter(&self) -> f32 {
        (self.trunk_base_radius - 2.0).max(1.0)
    }

    /// Height of the canopy center above the tree root.
    pub fn canopy_offset(&self) -> f32 {
        (self.trunk_height + self.canopy_diameter) / 2.0 - 2.0
    }

    /// Largest per-axis canopy vertex offset.
    pub fn max_jitter(&self) -> f32 {
        self.canopy_diameter / 10.0
    }
}

/// Canopy vertices that share an original position.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexCluster {
    pub origin: Vec3,
    /// Vertex indices (not float offsets) into the position buffer.
    pub vertices: Vec<usize>,
}

/// A generated tree: canopy and trunk under one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeMeshGroup {
    pub root: NodeId,
    pub canopy: NodeId,
    pub trunk: NodeId,
}

/// Group vertices of a flat `[x, y, z, ...]` buffer whose positions are
/// equal or within the cluster epsilon of a cluster's first vertex.
pub fn cluster_vertices(positions: &[f32]) -> Vec<VertexCluster> {
    let mut clusters: Vec<VertexCluster> = Vec::new();
    for (index, chunk) in positions.chunks_exact(3).enumerate() {
        let point = Vec3::from_slice(chunk);
        let existing = clusters
            .iter_mut()
            .find(|c| c.origin == point || c.origin.distance_squared(point) < CLUSTER_EPSILON_SQ);
        match existing {
            Some(cluster) => cluster.vertices.push(index),
            None => clusters.push(VertexCluster {
                origin: point,
                vertices: vec![index],
            }),
        }
    }
    clusters
}

/// Displace every cluster by one random offset in `[-max_offset, max_offset]`
/// per axis. Returns the offset applied to each cluster, in cluster order.
pub fn perturb<R: Rng>(
    positions: &mut [f32],
    clusters: &[VertexCluster],
    max_offset: f32,
    rng: &mut R,
) -> Vec<Vec3> {
    clusters
        .iter()
        .map(|cluster| {
            let offset = Vec3::new(
                jitter(rng, max_offset),
                jitter(rng, max_offset),
                jitter(rng, max_offset),
            );
            for &vertex in &cluster.vertices {
                let base = vertex * 3;
                positions[base] += offset.x;
                positions[base + 1] += offset.y;
                positions[base + 2] += offset.z;
            }
            offset
        })
        .collect()
}

fn jitter<R: Rng>(rng: &mut R, max_offset: f32) -> f32 {
    if max_offset <= 0.0 {
        return 0.0;
    }
    rng.random_range(-max_offset..=max_offset)
}

/// Build one low-poly tree with its root at `(x, trunk_height, z)`.
///
/// Returns `None` when the canopy exposes no vertex positions or any later
/// step fails; nothing built for the tree is left in the scene.
pub fn generate_tree<B: SceneBackend, R: Rng>(
    scene: &mut B,
    params: &TreeParams,
    x: f32,
    z: f32,
    rng: &mut R,
) -> Option<TreeMeshGroup> {
    let canopy = scene.create_sphere(
        "canopy",
        SphereOptions {
            diameter: params.canopy_diameter,
            segments: CANOPY_SEGMENTS,
        },
    );
    let Some(positions) = scene.vertex_data(canopy, VertexKind::Position).map(<[f32]>::to_vec) else {
        warn!(x, z, "canopy has no vertex positions, skipping tree");
        scene.dispose(canopy);
        return None;
    };

    let trunk = scene.create_cylinder(
        "trunk",
        CylinderOptions {
            height: params.trunk_height,
            diameter_top: params.trunk_top_diameter(),
            diameter_bottom: params.trunk_base_radius,
            tessellation: TRUNK_TESSELLATION,
            subdivisions: TRUNK_SUBDIVISIONS,
        },
    );
    let root = scene.create_transform_node("tree");
    let group = TreeMeshGroup { root, canopy, trunk };
    let mut materials = Vec::with_capacity(2);

    let root_position = Vec3::new(x, params.trunk_height, z);
    match assemble(scene, params, group, positions, root_position, &mut materials, rng) {
        Ok(()) => {
            debug!(tree = %root.short(), x, z, "tree generated");
            Some(group)
        }
        Err(err) => {
            warn!(x, z, error = %err, "tree construction failed, skipping");
            for id in [root, canopy, trunk] {
                scene.dispose(id);
            }
            for material in materials {
                scene.dispose_material(material);
            }
            None
        }
    }
}

fn assemble<B: SceneBackend, R: Rng>(
    scene: &mut B,
    params: &TreeParams,
    group: TreeMeshGroup,
    mut positions: Vec<f32>,
    root_position: Vec3,
    materials: &mut Vec<MaterialId>,
    rng: &mut R,
) -> Result<(), SceneError> {
    let clusters = cluster_vertices(&positions);
    perturb(&mut positions, &clusters, params.max_jitter(), rng);
    let indices = scene.indices(group.canopy).map(<[u32]>::to_vec).unwrap_or_default();
    let normals = compute_normals(&positions, &indices);
    scene.set_vertex_data(group.canopy, VertexKind::Position, positions)?;
    scene.set_vertex_data(group.canopy, VertexKind::Normal, normals)?;
    scene.convert_to_flat_shaded(group.canopy)?;
    scene.convert_to_flat_shaded(group.trunk)?;

    let leaf = scene.create_material(Material::new("leafMaterial").with_diffuse(LEAF_COLOR));
    materials.push(leaf);
    let mut wood = Material::new("woodMaterial");
    wood.diffuse_texture = Some(TextureSource::ProceduralWood {
        size: WOOD_TEXTURE_SIZE,
        amp_scale: WOOD_AMP_SCALE,
    });
    let wood = scene.create_material(wood);
    materials.push(wood);

    scene.set_parent(group.canopy, Some(group.root))?;
    scene.set_parent(group.trunk, Some(group.root))?;

    for (id, material) in [(group.canopy, Some(leaf)), (group.trunk, Some(wood)), (group.root, None)] {
        let node = scene.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.check_collisions = true;
        if material.is_some() {
            node.material = material;
        }
    }
    scene.set_position(group.canopy, Vec3::new(0.0, params.canopy_offset(), 0.0))?;
    scene.set_position(group.root, root_position)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_common::Ray;
    use playground_scene::{CameraKind, MaterialId, MeshData, Node, PickInfo, Scene, SoundId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn canopy_positions(diameter: f32) -> Vec<f32> {
        MeshData::sphere(&SphereOptions { diameter, segments: 2 }).positions
    }

    #[test]
    fn params_defaults_and_derived_sizes() {
        let params = TreeParams::default();
        assert_eq!(params.canopy_offset(), 28.0);
        assert_eq!(params.trunk_top_diameter(), 8.0);
        assert_eq!(params.max_jitter(), 2.5);
        let thin = TreeParams {
            trunk_base_radius: 2.5,
            ..params
        };
        assert_eq!(thin.trunk_top_diameter(), 1.0);
    }

    #[test]
    fn low_res_sphere_has_26_logical_points() {
        let clusters = cluster_vertices(&canopy_positions(25.0));
        assert_eq!(clusters.len(), 26);
        let total: usize = clusters.iter().map(|c| c.vertices.len()).sum();
        assert_eq!(total, 45);
    }

    #[test]
    fn near_duplicates_join_a_cluster() {
        let positions = [0.0, 0.0, 0.0, 0.05, 0.0, 0.0, 1.0, 0.0, 0.0];
        let clusters = cluster_vertices(&positions);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].vertices, vec![0, 1]);
        assert_eq!(clusters[1].vertices, vec![2]);
    }

    #[test]
    fn clustered_vertices_share_displacement() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let original = canopy_positions(25.0);
            let clusters = cluster_vertices(&original);
            let mut perturbed = original.clone();
            let offsets = perturb(&mut perturbed, &clusters, 2.5, &mut rng);

            let displacement = |i: usize| {
                Vec3::from_slice(&perturbed[i * 3..i * 3 + 3]) - Vec3::from_slice(&original[i * 3..i * 3 + 3])
            };
            for (cluster, offset) in clusters.iter().zip(&offsets) {
                let first = displacement(cluster.vertices[0]);
                for &v in &cluster.vertices {
                    assert_eq!(displacement(v), first);
                }
                assert!(offset.abs().max_element() <= 2.5);
                assert!(first.distance(*offset) < 1e-4);
            }
            let distinct = offsets.windows(2).filter(|w| w[0] != w[1]).count();
            assert!(distinct > 0);
        }
    }

    #[test]
    fn zero_jitter_leaves_positions() {
        let mut rng = StdRng::seed_from_u64(1);
        let original = canopy_positions(10.0);
        let mut positions = original.clone();
        let clusters = cluster_vertices(&positions);
        perturb(&mut positions, &clusters, 0.0, &mut rng);
        assert_eq!(positions, original);
    }

    #[test]
    fn generated_tree_layout() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(7);
        let params = TreeParams::default();
        let tree = generate_tree(&mut scene, &params, 12.0, -40.0, &mut rng).unwrap();

        let root = scene.node(tree.root).unwrap();
        assert_eq!(root.transform.position, Vec3::new(12.0, 35.0, -40.0));
        assert!(root.check_collisions);

        let canopy = scene.node(tree.canopy).unwrap();
        assert_eq!(canopy.parent, Some(tree.root));
        assert_eq!(canopy.transform.position, Vec3::new(0.0, 28.0, 0.0));
        assert!(canopy.check_collisions);
        let leaf = scene.material(canopy.material.unwrap()).unwrap();
        assert_eq!(leaf.diffuse_color, LEAF_COLOR);

        let geometry = canopy.geometry().unwrap();
        assert_eq!(geometry.vertex_count(), geometry.triangle_count() * 3);
        let reach = 12.5 + 2.5 * 3f32.sqrt() + 1e-3;
        for i in 0..geometry.vertex_count() {
            assert!(geometry.position(i).length() <= reach);
        }

        let trunk = scene.node(tree.trunk).unwrap();
        assert_eq!(trunk.parent, Some(tree.root));
        assert!(trunk.check_collisions);
        let wood = scene.material(trunk.material.unwrap()).unwrap();
        assert!(matches!(wood.diffuse_texture, Some(TextureSource::ProceduralWood { size: 512, .. })));
        let trunk_geometry = trunk.geometry().unwrap();
        assert_eq!(trunk_geometry.vertex_count(), trunk_geometry.triangle_count() * 3);
    }

    #[test]
    fn tree_blocks_rays() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(3);
        let tree = generate_tree(&mut scene, &TreeParams::default(), 0.0, 0.0, &mut rng).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 40.0, -100.0), Vec3::Z, 200.0).unwrap();
        let hit = scene.pick_with_ray(&ray).unwrap();
        assert!(hit.node == tree.trunk || hit.node == tree.canopy);
    }

    #[derive(Clone, Copy)]
    enum Fault {
        /// Meshes never expose vertex positions.
        NoVertexData,
        /// Every reparenting is refused.
        NoParenting,
    }

    /// In-memory scene with one injected failure.
    struct Faulty(Scene, Fault);

    impl SceneBackend for Faulty {
        fn create_transform_node(&mut self, name: &str) -> NodeId {
            self.0.create_transform_node(name)
        }
        fn create_sphere(&mut self, name: &str, options: SphereOptions) -> NodeId {
            self.0.create_sphere(name, options)
        }
        fn create_cylinder(&mut self, name: &str, options: CylinderOptions) -> NodeId {
            self.0.create_cylinder(name, options)
        }
        fn create_box(&mut self, name: &str, size: f32) -> NodeId {
            self.0.create_box(name, size)
        }
        fn create_camera(&mut self, name: &str, kind: CameraKind, position: Vec3) -> NodeId {
            self.0.create_camera(name, kind, position)
        }
        fn create_material(&mut self, material: Material) -> MaterialId {
            self.0.create_material(material)
        }
        fn dispose_material(&mut self, material: MaterialId) {
            self.0.dispose_material(material)
        }
        fn node(&self, id: NodeId) -> Option<&Node> {
            self.0.node(id)
        }
        fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
            self.0.node_mut(id)
        }
        fn vertex_data(&self, id: NodeId, kind: VertexKind) -> Option<&[f32]> {
            match self.1 {
                Fault::NoVertexData => None,
                Fault::NoParenting => self.0.vertex_data(id, kind),
            }
        }
        fn indices(&self, id: NodeId) -> Option<&[u32]> {
            self.0.indices(id)
        }
        fn set_vertex_data(&mut self, id: NodeId, kind: VertexKind, data: Vec<f32>) -> Result<(), SceneError> {
            self.0.set_vertex_data(id, kind, data)
        }
        fn convert_to_flat_shaded(&mut self, id: NodeId) -> Result<(), SceneError> {
            self.0.convert_to_flat_shaded(id)
        }
        fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
            match (self.1, parent) {
                (Fault::NoParenting, Some(parent)) => Err(SceneError::ParentCycle { child, parent }),
                _ => self.0.set_parent(child, parent),
            }
        }
        fn clone_node(&mut self, id: NodeId, name: &str) -> Result<NodeId, SceneError> {
            self.0.clone_node(id, name)
        }
        fn absolute_position(&self, id: NodeId) -> Option<Vec3> {
            self.0.absolute_position(id)
        }
        fn pick_with_ray(&mut self, ray: &Ray) -> Option<PickInfo> {
            self.0.pick_with_ray(ray)
        }
        fn dispose(&mut self, id: NodeId) {
            self.0.dispose(id)
        }
        fn load_sound(&mut self, name: &str, path: &str) -> SoundId {
            self.0.load_sound(name, path)
        }
        fn play_sound(&mut self, sound: SoundId) {
            self.0.play_sound(sound)
        }
        fn dispose_sound(&mut self, sound: SoundId) {
            self.0.dispose_sound(sound)
        }
        fn attach_control(&mut self, camera: NodeId) -> Result<(), SceneError> {
            self.0.attach_control(camera)
        }
    }

    #[test]
    fn missing_vertex_data_skips_tree() {
        let mut scene = Faulty(Scene::new(), Fault::NoVertexData);
        let mut rng = StdRng::seed_from_u64(0);
        let tree = generate_tree(&mut scene, &TreeParams::default(), 0.0, 0.0, &mut rng);
        assert!(tree.is_none());
        assert_eq!(scene.0.node_count(), 0);
        assert_eq!(scene.0.material_count(), 0);
    }

    #[test]
    fn failed_assembly_releases_nodes_and_materials() {
        let mut scene = Faulty(Scene::new(), Fault::NoParenting);
        let mut rng = StdRng::seed_from_u64(0);
        let tree = generate_tree(&mut scene, &TreeParams::default(), 0.0, 0.0, &mut rng);
        assert!(tree.is_none());
        assert_eq!(scene.0.node_count(), 0);
        assert_eq!(scene.0.material_count(), 0);
    }
}
