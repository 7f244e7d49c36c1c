use std::time::Duration;

use playground_combat::{Shot, User};
use playground_input::{Action, InputBinding, InputEvent};
use playground_render::{FrameOutcome, RenderLoop, RenderView, Renderer};
use playground_scene::{Scene, SceneBackend};
use playground_world::{GeneratedWorld, SceneGenerator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::{GameConfig, GameError};

/// Counters reported when a game is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub frames: u64,
    pub dropped_frames: u64,
    pub nodes_released: usize,
}

/// A running playground: scene, player, input state and frame loop.
pub struct Game {
    scene: Scene,
    user: User,
    world: GeneratedWorld,
    binding: InputBinding,
    render_loop: RenderLoop,
    rng: StdRng,
    clock: Duration,
    since_tick: Duration,
    lock_requests: u64,
}

impl Game {
    /// Generate the world, create the player and arm them.
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let scene = Scene::with_asset_root(&config.asset_root);
        let mut generator = SceneGenerator::new(scene, config.camera, config.world.clone())?;
        let world = generator.generate(&mut rng)?;
        let (mut scene, camera) = generator.into_parts();

        let user = match config.weapon {
            Some(kind) => User::equipped(&mut scene, camera, kind, config.jump)?,
            None => User::unarmed(&mut scene, camera, config.jump)?,
        };
        info!(
            camera = ?config.camera,
            weapon = ?config.weapon,
            seed = ?config.seed,
            trees = world.trees.len(),
            "game ready"
        );

        Ok(Self {
            scene,
            user,
            world,
            binding: InputBinding::new(),
            render_loop: RenderLoop::new(),
            rng,
            clock: Duration::ZERO,
            since_tick: Duration::ZERO,
            lock_requests: 0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn world(&self) -> &GeneratedWorld {
        &self.world
    }

    pub fn binding(&self) -> &InputBinding {
        &self.binding
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    /// Simulated time since the game started.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// How many times the surface was asked for pointer capture.
    pub fn lock_requests(&self) -> u64 {
        self.lock_requests
    }

    /// Route one raw input event. Returns the shots it fired, if any.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<Vec<Shot>, GameError> {
        let mut shots = Vec::new();
        for action in self.binding.map(event) {
            match action {
                Action::Fire => shots.extend(self.user.fire_weapon(&mut self.scene, &mut self.rng)?),
                Action::Jump => {
                    self.user.jump(&self.scene, self.clock);
                }
                Action::RequestPointerLock => {
                    self.lock_requests += 1;
                    debug!("pointer lock requested");
                }
                Action::Look { dx, dy } => {
                    if let Some(camera) = self.scene.camera_mut(self.user.camera()) {
                        camera.rotate(dx, dy);
                    }
                }
                Action::Press(key) => self.scene.key_down(key),
                Action::Release(key) => self.scene.key_up(key),
            }
        }
        Ok(shots)
    }

    /// Advance simulated time by `dt`: run due jump ticks, then render.
    pub fn frame(&mut self, dt: Duration) -> FrameOutcome {
        let Self {
            scene,
            user,
            render_loop,
            clock,
            since_tick,
            ..
        } = self;
        render_loop.run_frame(|| -> Result<(), GameError> {
            *clock += dt;
            *since_tick += dt;
            let interval = user.jump_config().tick_interval();
            while *since_tick >= interval {
                *since_tick -= interval;
                user.tick(&mut *scene, clock.saturating_sub(*since_tick))?;
            }
            scene.render(dt.as_secs_f32())?;
            Ok(())
        })
    }

    /// Render the current view with `renderer`, if the player camera exists.
    pub fn render<R: Renderer>(&self, renderer: &R) -> Option<R::Output> {
        let view = RenderView::from_camera(&self.scene, self.user.camera())?;
        Some(renderer.render(&self.scene, &view))
    }

    /// Stop the loop and release everything the game created.
    pub fn dispose(mut self) -> GameSummary {
        self.render_loop.stop();
        let nodes_released = self.scene.node_count();
        self.user.dispose(&mut self.scene);
        self.scene.dispose_all();
        let summary = GameSummary {
            frames: self.render_loop.frames(),
            dropped_frames: self.render_loop.dropped_frames(),
            nodes_released,
        };
        info!(?summary, "game disposed");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use playground_combat::WeaponKind;
    use playground_common::Key;
    use playground_input::CameraStrategy;
    use playground_render::DebugTextRenderer;
    use playground_scene::EVENT_LOG_CAPACITY;
    use playground_world::WorldConfig;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn config(dir: &tempfile::TempDir) -> GameConfig {
        GameConfig {
            asset_root: dir.path().to_path_buf(),
            seed: Some(21),
            world: WorldConfig {
                tree_count: 4,
                ground_subdivisions: 5,
                ..WorldConfig::default()
            },
            ..GameConfig::default()
        }
    }

    #[test]
    fn game_builds_world_and_player() {
        let dir = tempfile::tempdir().unwrap();
        let game = Game::new(&config(&dir)).unwrap();
        assert_eq!(game.world().trees.len(), 4);
        assert_eq!(game.scene().attached_camera(), Some(game.user().camera()));
        assert_eq!(game.user().weapon().map(|w| w.kind()), Some(WeaponKind::LaserGun));
    }

    #[test]
    fn same_seed_same_trees() {
        let dir = tempfile::tempdir().unwrap();
        let roots = |game: &Game| {
            game.world()
                .trees
                .iter()
                .map(|t| game.scene().node(t.root).unwrap().transform.position)
                .collect::<Vec<_>>()
        };
        let a = Game::new(&config(&dir)).unwrap();
        let b = Game::new(&config(&dir)).unwrap();
        assert_eq!(roots(&a), roots(&b));
    }

    #[test]
    fn first_click_requests_lock_and_fires() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        let shots = game.handle_event(InputEvent::PointerClick).unwrap();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].ray.length(), 2000.0);
        assert_eq!(game.lock_requests(), 1);

        game.handle_event(InputEvent::PointerLockChanged(true)).unwrap();
        game.handle_event(InputEvent::PointerClick).unwrap();
        assert_eq!(game.lock_requests(), 1);
    }

    #[test]
    fn shotgun_config_fires_eight() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&GameConfig {
            weapon: Some(WeaponKind::Shotgun),
            ..config(&dir)
        })
        .unwrap();
        let shots = game.handle_event(InputEvent::PointerClick).unwrap();
        assert_eq!(shots.len(), 8);
        assert!(shots.iter().all(|s| s.ray.length() == 50.0));
    }

    #[test]
    fn unarmed_click_fires_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&GameConfig {
            weapon: None,
            ..config(&dir)
        })
        .unwrap();
        assert!(game.handle_event(InputEvent::PointerClick).unwrap().is_empty());
    }

    #[test]
    fn space_release_jumps_until_duration_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        for _ in 0..30 {
            game.frame(FRAME);
        }
        game.handle_event(InputEvent::KeyDown(Key::Space)).unwrap();
        assert!(!game.user().is_jumping());
        game.handle_event(InputEvent::KeyUp(Key::Space)).unwrap();
        assert!(game.user().is_jumping());

        let before = game.scene().node(game.user().camera()).unwrap().transform.position.y;
        for _ in 0..5 {
            assert_eq!(game.frame(FRAME), FrameOutcome::Rendered);
        }
        let lifted = game.scene().node(game.user().camera()).unwrap().transform.position.y;
        assert!(lifted > before);

        for _ in 0..40 {
            game.frame(FRAME);
        }
        assert!(!game.user().is_jumping());
    }

    #[test]
    fn look_rotates_only_when_locked() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        let camera = game.user().camera();
        let yaw = game.scene().camera(camera).unwrap().yaw;
        game.handle_event(InputEvent::PointerMove { dx: 200.0, dy: 0.0 }).unwrap();
        assert_eq!(game.scene().camera(camera).unwrap().yaw, yaw);
        game.handle_event(InputEvent::PointerLockChanged(true)).unwrap();
        game.handle_event(InputEvent::PointerMove { dx: 200.0, dy: 0.0 }).unwrap();
        assert_ne!(game.scene().camera(camera).unwrap().yaw, yaw);
    }

    #[test]
    fn held_key_moves_player() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        let camera = game.user().camera();
        let start = game.scene().node(camera).unwrap().transform.position;
        game.handle_event(InputEvent::KeyDown(Key::W)).unwrap();
        for _ in 0..10 {
            game.frame(FRAME);
        }
        game.handle_event(InputEvent::KeyUp(Key::W)).unwrap();
        let end = game.scene().node(camera).unwrap().transform.position;
        let horizontal = Vec3::new(end.x - start.x, 0.0, end.z - start.z);
        assert!(horizontal.length() > 0.0);
    }

    #[test]
    fn failing_frame_is_dropped_and_loop_survives() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        assert_eq!(game.frame(FRAME), FrameOutcome::Rendered);
        let camera = game.user().camera();
        game.scene_mut().dispose(camera);
        assert_eq!(game.frame(FRAME), FrameOutcome::Dropped);
        assert_eq!(game.frame(FRAME), FrameOutcome::Dropped);
        assert!(game.render_loop().is_running());
        assert_eq!(game.render_loop().dropped_frames(), 2);
    }

    #[test]
    fn long_session_keeps_event_log_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&config(&dir)).unwrap();
        game.handle_event(InputEvent::PointerLockChanged(true)).unwrap();
        for _ in 0..1100 {
            game.handle_event(InputEvent::PointerClick).unwrap();
            game.frame(FRAME);
        }
        assert_eq!(game.scene().events().len(), EVENT_LOG_CAPACITY);
        assert_eq!(game.render_loop().dropped_frames(), 0);
    }

    #[test]
    fn render_and_dispose() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = Game::new(&GameConfig {
            camera: CameraStrategy::Free,
            ..config(&dir)
        })
        .unwrap();
        game.frame(FRAME);
        let text = game.render(&DebugTextRenderer::with_limit(3)).unwrap();
        assert!(text.contains("frame=1"));

        let nodes = game.scene().node_count();
        let summary = game.dispose();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.dropped_frames, 0);
        assert_eq!(summary.nodes_released, nodes);
    }
}
