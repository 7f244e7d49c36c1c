//! Shared types for the playground: node identity, transforms, colors,
//! keys and rays.
//!
//! # Invariants
//! - A `Ray` direction is always unit length.

mod ray;
mod types;

pub use ray::Ray;
pub use types::{Color3, Key, NodeId, Transform};

/// Errors from constructing shared value types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommonError {
    #[error("ray direction {0:?} has no length")]
    DegenerateDirection(glam::Vec3),
    #[error("ray length must be positive and finite, got {0}")]
    InvalidLength(f32),
}
