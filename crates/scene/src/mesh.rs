use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Vertex buffer channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    Position,
    Normal,
}

/// Options for a UV sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereOptions {
    pub diameter: f32,
    pub segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            diameter: 1.0,
            segments: 32,
        }
    }
}

/// Options for a capped, optionally tapered cylinder primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderOptions {
    pub height: f32,
    pub diameter_top: f32,
    pub diameter_bottom: f32,
    pub tessellation: u32,
    pub subdivisions: u32,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            height: 2.0,
            diameter_top: 1.0,
            diameter_bottom: 1.0,
            tessellation: 24,
            subdivisions: 1,
        }
    }
}

/// CPU-side geometry: flat `[x, y, z, ...]` positions and normals plus a
/// triangle index buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        vec3_at(&self.positions, index)
    }

    pub fn channel(&self, kind: VertexKind) -> &[f32] {
        match kind {
            VertexKind::Position => &self.positions,
            VertexKind::Normal => &self.normals,
        }
    }

    /// Iterate triangles as position triples in local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.position(tri[0] as usize),
                self.position(tri[1] as usize),
                self.position(tri[2] as usize),
            ]
        })
    }

    /// Local-space bounding sphere: AABB center and the farthest vertex from it.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, 0.0);
        }
        let (min, max) = (0..self.vertex_count()).map(|i| self.position(i)).fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(p), max.max(p)),
        );
        let center = (min + max) * 0.5;
        let radius = (0..self.vertex_count())
            .map(|i| self.position(i).distance(center))
            .fold(0.0_f32, f32::max);
        (center, radius)
    }

    /// UV sphere built ring by ring from the north pole. Each ring repeats
    /// its first vertex at the seam and both poles are rings of coincident
    /// vertices, so `segments = s` yields `(s + 3) * (2s + 5)` vertices.
    pub fn sphere(options: &SphereOptions) -> Self {
        let radius = options.diameter / 2.0;
        let z_steps = 2 + options.segments as usize;
        let y_steps = 2 * z_steps;
        let mut mesh = Self::default();

        for zi in 0..=z_steps {
            let angle_z = zi as f32 / z_steps as f32 * PI;
            for yi in 0..=y_steps {
                let angle_y = yi as f32 / y_steps as f32 * TAU;
                let unit = Vec3::new(
                    angle_z.sin() * angle_y.cos(),
                    angle_z.cos(),
                    angle_z.sin() * angle_y.sin(),
                );
                push_vec3(&mut mesh.positions, unit * radius);
                push_vec3(&mut mesh.normals, unit);
            }

            if zi > 0 {
                let count = mesh.vertex_count();
                let mut first = count - 2 * (y_steps + 1);
                while first + y_steps + 2 < count {
                    let below = first + y_steps + 1;
                    if zi > 1 {
                        push_tri(&mut mesh.indices, first, first + 1, below);
                    }
                    if zi < z_steps {
                        push_tri(&mut mesh.indices, below, first + 1, below + 1);
                    }
                    first += 1;
                }
            }
        }
        mesh
    }

    /// Cylinder centered on the origin along Y, tapering linearly from
    /// `diameter_bottom` to `diameter_top`, with both ends capped.
    pub fn cylinder(options: &CylinderOptions) -> Self {
        let n = options.tessellation.max(3) as usize;
        let rings = options.subdivisions.max(1) as usize;
        let mut mesh = Self::default();

        let slope = (options.diameter_bottom - options.diameter_top) / 2.0 / options.height;
        for ring in 0..=rings {
            let t = ring as f32 / rings as f32;
            let y = -options.height / 2.0 + t * options.height;
            let radius = (options.diameter_bottom + t * (options.diameter_top - options.diameter_bottom)) / 2.0;
            for j in 0..=n {
                let angle = j as f32 / n as f32 * TAU;
                let (sin, cos) = angle.sin_cos();
                push_vec3(&mut mesh.positions, Vec3::new(cos * radius, y, sin * radius));
                let normal = Vec3::new(cos, slope, sin).normalize_or_zero();
                push_vec3(&mut mesh.normals, normal);
            }
        }
        for ring in 0..rings {
            for j in 0..n {
                let a = ring * (n + 1) + j;
                let b = a + n + 1;
                push_tri(&mut mesh.indices, a, b, a + 1);
                push_tri(&mut mesh.indices, b, b + 1, a + 1);
            }
        }

        for (y, diameter, up) in [
            (-options.height / 2.0, options.diameter_bottom, -1.0),
            (options.height / 2.0, options.diameter_top, 1.0),
        ] {
            let center = mesh.vertex_count();
            push_vec3(&mut mesh.positions, Vec3::new(0.0, y, 0.0));
            push_vec3(&mut mesh.normals, Vec3::Y * up);
            for j in 0..=n {
                let angle = j as f32 / n as f32 * TAU;
                let (sin, cos) = angle.sin_cos();
                let radius = diameter / 2.0;
                push_vec3(&mut mesh.positions, Vec3::new(cos * radius, y, sin * radius));
                push_vec3(&mut mesh.normals, Vec3::Y * up);
            }
            for j in 0..n {
                let (a, b) = (center + 1 + j, center + 2 + j);
                if up > 0.0 {
                    push_tri(&mut mesh.indices, center, b, a);
                } else {
                    push_tri(&mut mesh.indices, center, a, b);
                }
            }
        }
        mesh
    }

    /// Axis-aligned cube with four vertices per face.
    pub fn cuboid(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::default();
        for normal in [Vec3::Z, Vec3::NEG_Z, Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y] {
            let side1 = Vec3::new(normal.y, normal.z, normal.x);
            let side2 = normal.cross(side1);
            let base = mesh.vertex_count();
            for corner in [
                normal - side1 - side2,
                normal - side1 + side2,
                normal + side1 + side2,
                normal + side1 - side2,
            ] {
                push_vec3(&mut mesh.positions, corner * half);
                push_vec3(&mut mesh.normals, normal);
            }
            push_tri(&mut mesh.indices, base, base + 1, base + 2);
            push_tri(&mut mesh.indices, base, base + 2, base + 3);
        }
        mesh
    }

    /// Ground grid centered on the origin in the XZ plane. `height(u, v)`
    /// receives the column and row fractions in `[0, 1]`, row 0 at `+Z`.
    pub fn ground(width: f32, depth: f32, subdivisions: u32, height: impl Fn(f32, f32) -> f32) -> Self {
        let sub = subdivisions.max(1) as usize;
        let mut mesh = Self::default();
        for row in 0..=sub {
            for col in 0..=sub {
                let u = col as f32 / sub as f32;
                let v = row as f32 / sub as f32;
                let x = u * width - width / 2.0;
                let z = (1.0 - v) * depth - depth / 2.0;
                push_vec3(&mut mesh.positions, Vec3::new(x, height(u, v), z));
            }
        }
        for row in 0..sub {
            for col in 0..sub {
                let a = row * (sub + 1) + col;
                let below = a + sub + 1;
                push_tri(&mut mesh.indices, a, a + 1, below);
                push_tri(&mut mesh.indices, a + 1, below + 1, below);
            }
        }
        mesh.normals = compute_normals(&mesh.positions, &mesh.indices);
        mesh
    }

    /// Unindex the mesh so no vertex is shared between triangles and give
    /// every corner its face normal. Produces the faceted low-poly look.
    pub fn to_flat_shaded(&self) -> Self {
        let mut flat = Self::default();
        for (i, [a, b, c]) in self.triangles().enumerate() {
            let normal = (b - a).cross(c - a).normalize_or_zero();
            for p in [a, b, c] {
                push_vec3(&mut flat.positions, p);
                push_vec3(&mut flat.normals, normal);
            }
            let base = (i * 3) as u32;
            flat.indices.extend([base, base + 1, base + 2]);
        }
        flat
    }
}

/// Area-weighted vertex normals for an indexed triangle list.
pub fn compute_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0_f32; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vec3_at(positions, i as usize));
        let face = (b - a).cross(c - a);
        for &i in tri {
            let i = i as usize * 3;
            normals[i] += face.x;
            normals[i + 1] += face.y;
            normals[i + 2] += face.z;
        }
    }
    for n in normals.chunks_exact_mut(3) {
        let unit = Vec3::new(n[0], n[1], n[2]).normalize_or_zero();
        n.copy_from_slice(&unit.to_array());
    }
    normals
}

pub(crate) fn vec3_at(data: &[f32], index: usize) -> Vec3 {
    Vec3::new(data[index * 3], data[index * 3 + 1], data[index * 3 + 2])
}

fn push_vec3(data: &mut Vec<f32>, v: Vec3) {
    data.extend_from_slice(&v.to_array());
}

fn push_tri(indices: &mut Vec<u32>, a: usize, b: usize, c: usize) {
    indices.extend([a as u32, b as u32, c as u32]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(segments: u32) -> MeshData {
        MeshData::sphere(&SphereOptions {
            diameter: 25.0,
            segments,
        })
    }

    #[test]
    fn low_poly_sphere_vertex_and_triangle_counts() {
        let mesh = sphere(2);
        assert_eq!(mesh.vertex_count(), 45);
        // Two pole rings of 8 triangles and two inner bands of 16.
        assert_eq!(mesh.triangle_count(), 48);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = sphere(2);
        for i in 0..mesh.vertex_count() {
            assert!((mesh.position(i).length() - 12.5).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_seam_repeats_ring_start() {
        let mesh = sphere(2);
        // Third ring (equator) starts at 18 and its seam copy sits at 26.
        let start = mesh.position(18);
        let seam = mesh.position(26);
        assert!(start.distance_squared(seam) < 1e-6);
    }

    #[test]
    fn cylinder_tapers_top_to_bottom() {
        let mesh = MeshData::cylinder(&CylinderOptions {
            height: 35.0,
            diameter_top: 8.0,
            diameter_bottom: 10.0,
            tessellation: 10,
            subdivisions: 2,
        });
        let bottom = mesh.position(0);
        let top = mesh.position(2 * 11);
        assert!((bottom.y + 17.5).abs() < 1e-5);
        assert!((top.y - 17.5).abs() < 1e-5);
        assert!((Vec3::new(bottom.x, 0.0, bottom.z).length() - 5.0).abs() < 1e-5);
        assert!((Vec3::new(top.x, 0.0, top.z).length() - 4.0).abs() < 1e-5);
        // Sides: 2 rings of 10 quads; caps: 10 triangles each.
        assert_eq!(mesh.triangle_count(), 40 + 20);
    }

    #[test]
    fn cuboid_has_24_vertices() {
        let mesh = MeshData::cuboid(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        for i in 0..mesh.vertex_count() {
            let p = mesh.position(i);
            assert_eq!(p.abs(), Vec3::ONE);
        }
    }

    #[test]
    fn ground_grid_spans_footprint() {
        let mesh = MeshData::ground(1000.0, 1000.0, 4, |_, _| 0.0);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert_eq!(mesh.position(0), Vec3::new(-500.0, 0.0, 500.0));
        assert_eq!(mesh.position(24), Vec3::new(500.0, 0.0, -500.0));
        for i in 0..mesh.vertex_count() {
            let n = vec3_at(&mesh.normals, i);
            assert!(n.y.abs() > 0.99);
        }
    }

    #[test]
    fn flat_shading_unindexes() {
        let mesh = sphere(2);
        let flat = mesh.to_flat_shaded();
        assert_eq!(flat.vertex_count(), mesh.triangle_count() * 3);
        assert_eq!(flat.triangle_count(), mesh.triangle_count());
        // All three corners of a face share its normal.
        let n0 = vec3_at(&flat.normals, 0);
        assert_eq!(n0, vec3_at(&flat.normals, 1));
        assert_eq!(n0, vec3_at(&flat.normals, 2));
    }

    #[test]
    fn computed_normals_are_unit_and_outward() {
        let mesh = sphere(3);
        let normals = compute_normals(&mesh.positions, &mesh.indices);
        for i in 0..mesh.vertex_count() {
            let n = vec3_at(&normals, i);
            if n == Vec3::ZERO {
                continue;
            }
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.dot(mesh.position(i)) > 0.0);
        }
    }

    #[test]
    fn bounding_sphere_of_cube() {
        let (center, radius) = MeshData::cuboid(2.0).bounding_sphere();
        assert!(center.length() < 1e-6);
        assert!((radius - 3.0_f32.sqrt()).abs() < 1e-5);
    }
}
