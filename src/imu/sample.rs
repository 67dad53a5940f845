use nalgebra::{UnitQuaternion, Vector3};

use crate::geometry::Pose;

/// Gravity vector in world frame (m/s^2), Y-up.
pub const GRAVITY: Vector3<f64> = Vector3::new(0.0, -9.81, 0.0);

/// Ground-truth pose of the target plus the time elapsed since the previous
/// sample. This is what drives the inertial estimator in simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub pose: Pose,
    /// Seconds since the previous sample.
    pub dt: f64,
}

impl MotionSample {
    pub fn new(pose: Pose, dt: f64) -> Self {
        Self { pose, dt }
    }
}

/// Linear and angular rates for one tick, the input the inertial estimator
/// actually integrates.
///
/// Simulation produces these by differentiating poses (see
/// [`PoseDifferentiator`](super::PoseDifferentiator)); a hardware adapter
/// would fill them from gyro/accelerometer integration instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub dt: f64,
    /// World-frame linear velocity (m/s).
    pub velocity: Vector3<f64>,
    /// World-frame angular velocity as a scaled axis (rad/s).
    pub angular_velocity: Vector3<f64>,
    /// Trusted orientation to relax the integrated orientation towards.
    pub reference_orientation: Option<UnitQuaternion<f64>>,
}
