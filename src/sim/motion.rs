//! Deterministic target motion.

use std::f64::consts::TAU;

use nalgebra::{UnitQuaternion, Vector3};

use crate::geometry::Pose;
use crate::imu::MotionSample;

/// A head-mounted target walking a horizontal circle, bobbing vertically and
/// turning to face along its path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedMotion {
    pub center: Vector3<f64>,
    pub radius: f64,
    /// Angular speed around the circle (rad/s).
    pub angular_speed: f64,
    /// Vertical bob amplitude (m).
    pub bob_amplitude: f64,
    /// Vertical bob frequency (Hz).
    pub bob_frequency: f64,
}

impl Default for ScriptedMotion {
    fn default() -> Self {
        Self {
            center: Vector3::new(0.0, 1.5, 0.0),
            radius: 1.0,
            angular_speed: 0.5,
            bob_amplitude: 0.05,
            bob_frequency: 1.5,
        }
    }
}

impl ScriptedMotion {
    pub fn pose_at(&self, t: f64) -> Pose {
        let phase = self.angular_speed * t;
        let position = self.center
            + Vector3::new(
                self.radius * phase.cos(),
                self.bob_amplitude * (TAU * self.bob_frequency * t).sin(),
                self.radius * phase.sin(),
            );
        // Tangent of the circle is (-sin, 0, cos); heading about +Y so that
        // local +Z points along it.
        let heading = (-phase.sin()).atan2(phase.cos());
        let orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), heading);
        Pose::new(position, orientation)
    }

    /// Samples at `dt` spacing over `(0, duration]`.
    pub fn samples(&self, dt: f64, duration: f64) -> Vec<MotionSample> {
        if dt <= 0.0 {
            return Vec::new();
        }
        let n = (duration / dt).round() as usize;
        (1..=n)
            .map(|k| MotionSample::new(self.pose_at(k as f64 * dt), dt))
            .collect()
    }
}
