//! Combat: muzzle models, spread-jittered ray casts and the user that
//! jumps and fires.
//!
//! # Invariants
//! - Every ray direction is unit length.
//! - The transient clone used to sample a shot origin is disposed before
//!   the shot returns.
//! - A user holds at most one weapon and at most one running jump.

pub mod user;
pub mod weapon;

pub use user::{JumpConfig, User, jump_velocity};
pub use weapon::{Shot, Weapon, WeaponKind, WeaponSpec, shot_direction};

use playground_common::{CommonError, NodeId};
use playground_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("invalid ray: {0}")]
    Ray(#[from] CommonError),
    #[error("weapon is mounted on camera {weapon:?} but the user looks through {user:?}")]
    CameraMismatch { weapon: NodeId, user: NodeId },
}
