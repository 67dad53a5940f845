//! Rigid pose (position + orientation) in the Y-up world frame.
//!
//! Local frame convention for every posed object (sensors and the target):
//!
//! ```text
//!        +Y (up)
//!         |
//!         |
//!         +------ +X (right)
//!        /
//!       /
//!      +Z (forward)
//! ```

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Position + orientation of a rigid body in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Pose at `position` whose local +Z axis points along `forward`.
    ///
    /// World +Y is used as the up hint; when `forward` is (anti)parallel to it,
    /// world +Z is used instead. Returns `None` for a zero `forward`.
    pub fn looking_along(position: Vector3<f64>, forward: Vector3<f64>) -> Option<Self> {
        let dir = Unit::try_new(forward, 1e-12)?.into_inner();
        let up = if dir.cross(&Vector3::y()).norm_squared() < 1e-12 {
            Vector3::z()
        } else {
            Vector3::y()
        };
        Some(Self {
            position,
            orientation: UnitQuaternion::face_towards(&dir, &up),
        })
    }

    /// Local +Z axis in world coordinates.
    pub fn forward(&self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.orientation * Vector3::z())
    }

    pub fn up(&self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.orientation * Vector3::y())
    }

    /// Express a world-frame direction in this pose's local frame.
    pub fn direction_to_local(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.orientation.inverse_transform_vector(world)
    }

    /// Express a world-frame point in this pose's local frame.
    pub fn point_to_local(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.direction_to_local(&(world - self.position))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_looking_along_maps_forward() {
        let pose = Pose::looking_along(Vector3::new(10.0, 0.0, 0.0), -Vector3::x()).unwrap();
        assert_relative_eq!(pose.forward().into_inner(), -Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(pose.up().into_inner(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_looking_straight_up_is_well_defined() {
        let pose = Pose::looking_along(Vector3::zeros(), Vector3::y()).unwrap();
        assert_relative_eq!(pose.forward().into_inner(), Vector3::y(), epsilon = 1e-12);
        assert!(pose.orientation.coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_zero_forward_rejected() {
        assert!(Pose::looking_along(Vector3::zeros(), Vector3::zeros()).is_none());
    }

    #[test]
    fn test_point_to_local() {
        let pose = Pose::looking_along(Vector3::new(10.0, 0.0, 10.0), -Vector3::x()).unwrap();
        let local = pose.point_to_local(&Vector3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(local, Vector3::new(0.0, 0.0, 10.0), epsilon = 1e-12);
    }
}
