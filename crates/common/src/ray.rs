use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::CommonError;

/// A bounded ray query: origin, unit direction and maximum length.
///
/// Produced per shot and never persisted. Construction normalizes the
/// direction, so every `Ray` in flight satisfies `|direction| == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    length: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, length: f32) -> Result<Self, CommonError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(CommonError::InvalidLength(length));
        }
        let direction = direction
            .try_normalize()
            .ok_or(CommonError::DegenerateDirection(direction))?;
        Ok(Self {
            origin,
            direction,
            length,
        })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore intersection against triangle `(a, b, c)`, both faces.
    /// Returns the hit distance when it lies within `[0, length]`.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (0.0..=self.length).contains(&t).then_some(t)
    }

    /// Whether the ray passes within `radius` of `center` before running out.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let to_center = center - self.origin;
        let along = to_center.dot(self.direction).clamp(0.0, self.length);
        let closest = self.at(along);
        closest.distance_squared(center) <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0), 10.0).unwrap();
        assert!((ray.direction().length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.direction(), Vec3::new(0.6, 0.0, 0.8));
    }

    #[test]
    fn zero_direction_is_rejected() {
        let err = Ray::new(Vec3::ZERO, Vec3::ZERO, 1.0).unwrap_err();
        assert_eq!(err, CommonError::DegenerateDirection(Vec3::ZERO));
    }

    #[test]
    fn non_positive_length_is_rejected() {
        assert!(Ray::new(Vec3::ZERO, Vec3::X, 0.0).is_err());
        assert!(Ray::new(Vec3::ZERO, Vec3::X, f32::NAN).is_err());
    }

    #[test]
    fn triangle_hit_within_length() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, -5.0), Vec3::Z, 10.0).unwrap();
        let t = ray
            .intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .unwrap();
        assert!((t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_beyond_length_is_missed() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, -5.0), Vec3::Z, 4.0).unwrap();
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn triangle_behind_origin_is_missed() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::Z, 10.0).unwrap();
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn sphere_cull() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 10.0).unwrap();
        assert!(ray.intersects_sphere(Vec3::new(5.0, 0.5, 0.0), 1.0));
        assert!(!ray.intersects_sphere(Vec3::new(5.0, 3.0, 0.0), 1.0));
        assert!(!ray.intersects_sphere(Vec3::new(20.0, 0.0, 0.0), 1.0));
    }
}
