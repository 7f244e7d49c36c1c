use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use playground_combat::WeaponKind;
use playground_common::Key;
use playground_game::{Game, GameConfig};
use playground_input::{CameraStrategy, InputEvent};
use playground_render::DebugTextRenderer;
use playground_scene::{GroundOptions, Scene, SceneBackend};
use playground_world::{TreeParams, populate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "playground-cli", about = "Headless driver for the forest playground")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Game configuration file (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective configuration summary
    Info,
    /// Print the effective configuration as YAML
    Config,
    /// Build the world and drive it with scripted input
    Run {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// RNG seed, overriding the config
        #[arg(short, long)]
        seed: Option<u64>,
        /// Click (fire) every N frames; 0 disables
        #[arg(long, default_value = "30")]
        fire_every: u64,
        /// Release space (jump) at this frame
        #[arg(long)]
        jump_at: Option<u64>,
        /// Weapon override
        #[arg(long, value_parser = parse_weapon)]
        weapon: Option<WeaponKind>,
        /// Use the free-fly camera
        #[arg(long)]
        free: bool,
        /// Print the final frame with the debug renderer
        #[arg(long)]
        show: bool,
    },
    /// Generate trees on flat ground and list them
    Trees {
        /// Number of trees
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Ground edge length
        #[arg(long, default_value = "1000")]
        size: f32,
    },
}

fn parse_weapon(value: &str) -> Result<WeaponKind, String> {
    match value {
        "laser" | "laser_gun" => Ok(WeaponKind::LaserGun),
        "shotgun" => Ok(WeaponKind::Shotgun),
        other => Err(format!("unknown weapon '{other}', expected laser or shotgun")),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("playground-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("asset root: {}", config.asset_root.display());
            println!("camera: {:?}", config.camera);
            println!("weapon: {:?}", config.weapon);
            println!(
                "world: ground={}x{} trees={} canopy={} trunk={}",
                config.world.ground_size,
                config.world.ground_size,
                config.world.tree_count,
                config.world.tree.canopy_diameter,
                config.world.tree.trunk_height
            );
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Run {
            frames,
            seed,
            fire_every,
            jump_at,
            weapon,
            free,
            show,
        } => {
            let mut config = config;
            if seed.is_some() {
                config.seed = seed;
            }
            if weapon.is_some() {
                config.weapon = weapon;
            }
            if free {
                config.camera = CameraStrategy::Free;
            }
            let dt = Duration::from_secs_f64(1.0 / f64::from(config.frame_rate.max(1)));

            let mut game = Game::new(&config)?;
            let mut shots = 0usize;
            let mut hits = 0usize;
            for frame in 0..frames {
                if fire_every > 0 && frame % fire_every == 0 {
                    let fired = game.handle_event(InputEvent::PointerClick)?;
                    hits += fired.iter().filter(|s| s.hit.is_some()).count();
                    shots += fired.len();
                }
                if jump_at == Some(frame) {
                    game.handle_event(InputEvent::KeyUp(Key::Space))?;
                }
                game.frame(dt);
            }

            let camera = game.user().camera();
            let position = game
                .scene()
                .absolute_position(camera)
                .context("player camera vanished")?;
            println!(
                "Ran {frames} frames ({:.2}s): rays={shots} hits={hits} dropped={}",
                game.clock().as_secs_f32(),
                game.render_loop().dropped_frames()
            );
            println!(
                "Camera at ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            );
            if show {
                if let Some(text) = game.render(&DebugTextRenderer::with_limit(20)) {
                    print!("{text}");
                }
            }
            let summary = game.dispose();
            info!(?summary, "run complete");
        }
        Commands::Trees { count, seed, size } => {
            let mut scene = Scene::with_asset_root(&config.asset_root);
            let ground = scene.create_ground_from_heightmap(
                "ground",
                &config.world.heightmap,
                GroundOptions {
                    width: size,
                    depth: size,
                    subdivisions: config.world.ground_subdivisions,
                    min_height: config.world.min_height,
                    max_height: config.world.max_height,
                },
            );
            let params: TreeParams = config.world.tree;
            let mut rng = StdRng::seed_from_u64(seed);
            let trees = populate(&mut scene, &ground, count, &params, &mut rng);

            println!("Planted {} of {count} trees (seed={seed})", trees.len());
            for tree in &trees {
                let root = scene.absolute_position(tree.root).context("tree root vanished")?;
                let canopy = scene
                    .node(tree.canopy)
                    .and_then(|n| n.geometry())
                    .map_or(0, |g| g.triangle_count());
                println!(
                    "  [{}] root=({:.2}, {:.2}, {:.2}) canopy_triangles={canopy}",
                    tree.root.short(),
                    root.x,
                    root.y,
                    root.z
                );
            }
        }
    }

    Ok(())
}
