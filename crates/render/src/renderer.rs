use std::fmt::Write;

use glam::Vec3;
use playground_common::NodeId;
use playground_scene::{NodeKind, Scene, SceneBackend};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Unit view direction.
    pub forward: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, -25.0),
            forward: Vec3::Z,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    /// View through a camera node, or `None` if `camera` is not a camera.
    pub fn from_camera(scene: &Scene, camera: NodeId) -> Option<Self> {
        let state = scene.camera(camera)?;
        Some(Self {
            eye: scene.absolute_position(camera)?,
            forward: state.forward(),
            ..Self::default()
        })
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of the scene: frame, camera and visible meshes.
#[derive(Debug)]
pub struct DebugTextRenderer {
    max_meshes: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self { max_meshes: usize::MAX }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// List at most `max_meshes` meshes; the rest are summarized.
    pub fn with_limit(max_meshes: usize) -> Self {
        Self { max_meshes }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        let meshes: Vec<_> = scene
            .nodes()
            .iter()
            .filter(|(_, node)| node.visible && matches!(node.kind, NodeKind::Mesh(_)))
            .collect();

        let _ = writeln!(
            out,
            "=== Scene (frame={}, nodes={}) ===",
            scene.frame(),
            scene.node_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) forward=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.forward.x, view.forward.y, view.forward.z, view.fov_degrees
        );
        let _ = writeln!(out, "Meshes: {}", meshes.len());
        for (id, node) in meshes.iter().take(self.max_meshes) {
            let p = scene.absolute_position(**id).unwrap_or(node.transform.position);
            let _ = writeln!(
                out,
                "  [{}] {} pos=({:.2}, {:.2}, {:.2})",
                id.short(),
                node.name,
                p.x,
                p.y,
                p.z
            );
        }
        if meshes.len() > self.max_meshes {
            let _ = writeln!(out, "  ... {} more", meshes.len() - self.max_meshes);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_scene::CameraKind;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("frame=0"));
        assert!(output.contains("Meshes: 0"));
    }

    #[test]
    fn debug_renderer_lists_visible_meshes() {
        let mut scene = Scene::new();
        let crate_box = scene.create_box("crate", 1.0);
        scene.set_position(crate_box, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let hidden = scene.create_box("hidden", 1.0);
        scene.node_mut(hidden).unwrap().visible = false;

        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("Meshes: 1"));
        assert!(output.contains("crate pos=(1.00, 2.00, 3.00)"));
        assert!(!output.contains("hidden"));
    }

    #[test]
    fn debug_renderer_truncates() {
        let mut scene = Scene::new();
        for i in 0..5 {
            scene.create_box(&format!("b{i}"), 1.0);
        }
        let output = DebugTextRenderer::with_limit(2).render(&scene, &RenderView::default());
        assert!(output.contains("... 3 more"));
    }

    #[test]
    fn view_follows_camera() {
        let mut scene = Scene::new();
        let camera = scene.create_camera("cam", CameraKind::Free, Vec3::new(0.0, 2.0, -25.0));
        let view = RenderView::from_camera(&scene, camera).unwrap();
        assert_eq!(view.eye, Vec3::new(0.0, 2.0, -25.0));
        assert!(view.forward.distance(Vec3::Z) < 1e-6);

        let mesh = scene.create_box("box", 1.0);
        assert!(RenderView::from_camera(&scene, mesh).is_none());
    }
}
