//! Finite-difference rate adapter for simulated input.

use nalgebra::Vector3;

use super::sample::{MotionSample, RateSample};
use crate::geometry::Pose;

/// Turns successive ground-truth poses into [`RateSample`]s.
///
/// Velocity is `(p_k - p_{k-1}) / dt`. Angular velocity is the scaled axis of
/// `q_k * q_{k-1}⁻¹` divided by `dt`; nalgebra already reports the rotation
/// angle in `[0, π]` with the axis flipped as needed, so the delta is the
/// shortest rotation and needs no further unwrapping.
///
/// Ticks without a pose are accounted with [`PoseDifferentiator::skip`]; the
/// next pose is then differenced over the whole elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDifferentiator {
    last: Pose,
    pending_dt: f64,
}

impl PoseDifferentiator {
    pub fn new(initial: Pose) -> Self {
        Self {
            last: initial,
            pending_dt: 0.0,
        }
    }

    pub fn last(&self) -> &Pose {
        &self.last
    }

    /// Time elapsed since the last differenced pose that no sample covered yet.
    pub fn pending_dt(&self) -> f64 {
        self.pending_dt
    }

    pub fn reset(&mut self, pose: Pose) {
        self.last = pose;
        self.pending_dt = 0.0;
    }

    /// A tick passed without a pose. Non-positive `dt` is ignored.
    pub fn skip(&mut self, dt: f64) {
        if dt > 0.0 {
            self.pending_dt += dt;
        }
    }

    /// Returns `None` and leaves the adapter untouched when `dt <= 0`.
    pub fn differentiate(&mut self, sample: &MotionSample) -> Option<RateSample> {
        if sample.dt <= 0.0 {
            return None;
        }
        let dt = sample.dt + self.pending_dt;
        self.pending_dt = 0.0;

        let current = sample.pose;
        let velocity: Vector3<f64> = (current.position - self.last.position) / dt;
        let delta = current.orientation * self.last.orientation.inverse();
        let angular_velocity = delta.scaled_axis() / dt;

        self.last = current;

        Some(RateSample {
            dt,
            velocity,
            angular_velocity,
            reference_orientation: Some(current.orientation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    #[test]
    fn test_linear_velocity() {
        let mut diff = PoseDifferentiator::new(Pose::identity());
        let pose = Pose::new(Vector3::new(0.2, 0.0, -0.1), UnitQuaternion::identity());
        let rates = diff.differentiate(&MotionSample::new(pose, 0.1)).unwrap();

        assert_relative_eq!(rates.velocity, Vector3::new(2.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(rates.angular_velocity, Vector3::zeros(), epsilon = 1e-12);
        assert_eq!(diff.last(), &pose);
    }

    #[test]
    fn test_angular_velocity_about_up() {
        let mut diff = PoseDifferentiator::new(Pose::identity());
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.05);
        let rates = diff
            .differentiate(&MotionSample::new(Pose::new(Vector3::zeros(), q), 0.01))
            .unwrap();

        assert_relative_eq!(rates.angular_velocity, Vector3::new(0.0, 5.0, 0.0), epsilon = 1e-9);
        assert_eq!(rates.reference_orientation, Some(q));
    }

    #[test]
    fn test_wraps_to_shortest_rotation() {
        // 350° about +Y is the same as -10°.
        let start = Pose::identity();
        let mut diff = PoseDifferentiator::new(start);
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 350f64.to_radians());
        let rates = diff
            .differentiate(&MotionSample::new(Pose::new(Vector3::zeros(), q), 1.0))
            .unwrap();

        assert_relative_eq!(
            rates.angular_velocity,
            Vector3::new(0.0, -10f64.to_radians(), 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_skipped_ticks_extend_next_interval() {
        let mut diff = PoseDifferentiator::new(Pose::identity());
        let at = |x: f64| Pose::new(Vector3::new(x, 0.0, 0.0), UnitQuaternion::identity());
        diff.differentiate(&MotionSample::new(at(0.1), 0.1)).unwrap();

        for _ in 0..4 {
            diff.skip(0.1);
        }
        diff.skip(0.0);
        assert_relative_eq!(diff.pending_dt(), 0.4, epsilon = 1e-12);

        let rates = diff.differentiate(&MotionSample::new(at(0.6), 0.1)).unwrap();
        assert_relative_eq!(rates.dt, 0.5, epsilon = 1e-12);
        assert_relative_eq!(rates.velocity, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
        assert_eq!(diff.pending_dt(), 0.0);
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let start = Pose::new(Vector3::new(1.0, 2.0, 3.0), UnitQuaternion::identity());
        let mut diff = PoseDifferentiator::new(start);
        let moved = Pose::new(Vector3::new(5.0, 5.0, 5.0), UnitQuaternion::identity());

        assert!(diff.differentiate(&MotionSample::new(moved, 0.0)).is_none());
        assert!(diff.differentiate(&MotionSample::new(moved, -0.5)).is_none());
        assert_eq!(diff.last(), &start);
    }
}
