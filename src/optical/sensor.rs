//! Angle-only optical sensor.
//!
//! Each tick a sensor either sees the target and publishes a bearing, or
//! reports why it could not. Checks short-circuit in this order:
//! target present, not coincident with the sensor, line of sight, range,
//! field of view.

use std::fmt;

use anyhow::{Result, bail};
use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use super::occlusion::Occluder;
use crate::geometry::{Bearing, Pose};

/// Distance below which the target is considered to sit on the sensor.
const MIN_TARGET_DISTANCE: f64 = 1e-9;

/// Static configuration of one optical sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub id: u32,
    /// World position (m).
    pub position: [f64; 3],
    /// World forward axis; need not be normalized.
    pub forward: [f64; 3],
    /// Full horizontal field of view (degrees).
    pub horizontal_fov_deg: f64,
    /// Full vertical field of view (degrees).
    pub vertical_fov_deg: f64,
    /// Maximum sensing range (m).
    pub max_range: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            id: 0,
            position: [0.0, 0.0, 0.0],
            forward: [0.0, 0.0, 1.0],
            horizontal_fov_deg: 90.0,
            vertical_fov_deg: 60.0,
            max_range: 20.0,
        }
    }
}

/// Why a sensor has no bearing this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidReason {
    TargetMissing,
    /// Target sits on the sensor origin; no direction exists.
    Coincident,
    Occluded,
    OutOfRange { distance: f64 },
    OutsideFov { bearing: Bearing },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::TargetMissing => write!(f, "no target"),
            InvalidReason::Coincident => write!(f, "target at sensor origin"),
            InvalidReason::Occluded => write!(f, "occluded"),
            InvalidReason::OutOfRange { distance } => write!(f, "out of range ({distance:.2} m)"),
            InvalidReason::OutsideFov { bearing } => write!(
                f,
                "outside field of view ({:.1}°, {:.1}°)",
                bearing.horizontal_deg(),
                bearing.vertical_deg()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Visible(Bearing),
    Hidden(InvalidReason),
}

/// One sensor's output for one tick. Never carried across ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingReading {
    pub sensor_id: u32,
    pub origin: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub observation: Observation,
}

impl BearingReading {
    pub fn is_valid(&self) -> bool {
        matches!(self.observation, Observation::Visible(_))
    }

    pub fn bearing(&self) -> Option<Bearing> {
        match self.observation {
            Observation::Visible(bearing) => Some(bearing),
            Observation::Hidden(_) => None,
        }
    }

    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self.observation {
            Observation::Visible(_) => None,
            Observation::Hidden(reason) => Some(reason),
        }
    }

    pub fn forward(&self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.orientation * Vector3::z())
    }
}

/// A fixed optical sensor.
#[derive(Debug, Clone)]
pub struct OpticalSensor {
    id: u32,
    pose: Pose,
    half_horizontal_fov: f64,
    half_vertical_fov: f64,
    max_range: f64,
}

impl OpticalSensor {
    /// Field-of-view angles are full angles in degrees.
    pub fn new(
        id: u32,
        pose: Pose,
        horizontal_fov_deg: f64,
        vertical_fov_deg: f64,
        max_range: f64,
    ) -> Self {
        Self {
            id,
            pose,
            half_horizontal_fov: horizontal_fov_deg.to_radians() * 0.5,
            half_vertical_fov: vertical_fov_deg.to_radians() * 0.5,
            max_range,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        let Some(pose) =
            Pose::looking_along(Vector3::from(config.position), Vector3::from(config.forward))
        else {
            bail!("sensor {} has a zero forward axis", config.id);
        };
        Ok(Self::new(
            config.id,
            pose,
            config.horizontal_fov_deg,
            config.vertical_fov_deg,
            config.max_range,
        ))
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Sensors are fixed during a run, but a host may relocate them between ticks.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Compute this tick's reading for a target at `target` (or no target).
    pub fn observe<O: Occluder + ?Sized>(
        &self,
        target: Option<&Vector3<f64>>,
        occluder: &O,
    ) -> BearingReading {
        BearingReading {
            sensor_id: self.id,
            origin: self.pose.position,
            orientation: self.pose.orientation,
            observation: self.classify(target, occluder),
        }
    }

    fn classify<O: Occluder + ?Sized>(
        &self,
        target: Option<&Vector3<f64>>,
        occluder: &O,
    ) -> Observation {
        let Some(target) = target else {
            return Observation::Hidden(InvalidReason::TargetMissing);
        };

        let to_target = target - self.pose.position;
        let distance = to_target.norm();
        if distance < MIN_TARGET_DISTANCE {
            return Observation::Hidden(InvalidReason::Coincident);
        }

        let direction = Unit::new_unchecked(to_target / distance);
        if occluder.blocks(&self.pose.position, &direction, distance) {
            return Observation::Hidden(InvalidReason::Occluded);
        }

        if distance > self.max_range {
            return Observation::Hidden(InvalidReason::OutOfRange { distance });
        }

        let bearing = Bearing::from_local_direction(&self.pose.direction_to_local(&to_target));
        if bearing.horizontal.abs() > self.half_horizontal_fov
            || bearing.vertical.abs() > self.half_vertical_fov
        {
            return Observation::Hidden(InvalidReason::OutsideFov { bearing });
        }

        Observation::Visible(bearing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optical::occlusion::{NoObstructions, Obstruction, ObstructionSet};
    use approx::assert_relative_eq;

    fn sensor_at(position: Vector3<f64>, forward: Vector3<f64>) -> OpticalSensor {
        OpticalSensor::new(1, Pose::looking_along(position, forward).unwrap(), 90.0, 60.0, 20.0)
    }

    #[test]
    fn test_straight_ahead_is_zero_bearing() {
        let sensor = sensor_at(Vector3::zeros(), Vector3::z());
        let reading = sensor.observe(Some(&Vector3::new(0.0, 0.0, 10.0)), &NoObstructions);

        assert!(reading.is_valid());
        assert_eq!(reading.bearing(), Some(Bearing::new(0.0, 0.0)));
        assert_relative_eq!(reading.forward().into_inner(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_bearing_in_sensor_frame() {
        // Looking along -X; target ahead, 3 m to the sensor's right and 2 m up.
        let sensor = sensor_at(Vector3::new(10.0, 0.0, 0.0), -Vector3::x());
        let right = sensor.pose().orientation * Vector3::x();
        let target = Vector3::new(5.0, 2.0, 0.0) + right * 3.0;
        let bearing = sensor.observe(Some(&target), &NoObstructions).bearing().unwrap();

        assert_relative_eq!(bearing.horizontal, 3f64.atan2(5.0), epsilon = 1e-12);
        assert_relative_eq!(bearing.vertical, 2f64.atan2(5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_target() {
        let sensor = sensor_at(Vector3::zeros(), Vector3::z());
        let reading = sensor.observe(None, &NoObstructions);
        assert_eq!(reading.invalid_reason(), Some(InvalidReason::TargetMissing));
        assert!(reading.bearing().is_none());
    }

    #[test]
    fn test_coincident_target() {
        let sensor = sensor_at(Vector3::new(1.0, 1.0, 1.0), Vector3::z());
        let reading = sensor.observe(Some(&Vector3::new(1.0, 1.0, 1.0)), &NoObstructions);
        assert_eq!(reading.invalid_reason(), Some(InvalidReason::Coincident));
    }

    #[test]
    fn test_occlusion_checked_before_range() {
        let mut scene = ObstructionSet::new();
        scene.push(Obstruction::Sphere {
            center: Vector3::new(0.0, 0.0, 5.0),
            radius: 0.5,
        });
        let sensor = sensor_at(Vector3::zeros(), Vector3::z());

        let far = sensor.observe(Some(&Vector3::new(0.0, 0.0, 50.0)), &scene);
        assert_eq!(far.invalid_reason(), Some(InvalidReason::Occluded));

        let near = sensor.observe(Some(&Vector3::new(0.0, 0.0, 4.0)), &scene);
        assert!(near.is_valid());
    }

    #[test]
    fn test_range_gate() {
        let sensor = sensor_at(Vector3::zeros(), Vector3::z());
        let reading = sensor.observe(Some(&Vector3::new(0.0, 0.0, 25.0)), &NoObstructions);
        match reading.invalid_reason() {
            Some(InvalidReason::OutOfRange { distance }) => {
                assert_relative_eq!(distance, 25.0, epsilon = 1e-12)
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }

        // Exactly at max range is still visible.
        assert!(sensor
            .observe(Some(&Vector3::new(0.0, 0.0, 20.0)), &NoObstructions)
            .is_valid());
    }

    #[test]
    fn test_fov_gate() {
        let sensor = sensor_at(Vector3::zeros(), Vector3::z());

        // 44° horizontally is inside a 90° cone, 46° is not.
        let inside = Vector3::new(44f64.to_radians().tan(), 0.0, 1.0) * 5.0;
        let outside = Vector3::new(46f64.to_radians().tan(), 0.0, 1.0) * 5.0;
        assert!(sensor.observe(Some(&inside), &NoObstructions).is_valid());
        assert!(matches!(
            sensor.observe(Some(&outside), &NoObstructions).invalid_reason(),
            Some(InvalidReason::OutsideFov { .. })
        ));

        // Vertical half-angle is 30°.
        let high = Vector3::new(0.0, 31f64.to_radians().tan(), 1.0) * 5.0;
        assert!(!sensor.observe(Some(&high), &NoObstructions).is_valid());

        // Behind the sensor.
        let behind = Vector3::new(0.0, 0.0, -5.0);
        assert!(!sensor.observe(Some(&behind), &NoObstructions).is_valid());
    }

    #[test]
    fn test_from_config() {
        let config = SensorConfig {
            id: 7,
            position: [10.0, 0.0, 10.0],
            forward: [-2.0, 0.0, 0.0],
            ..SensorConfig::default()
        };
        let sensor = OpticalSensor::from_config(&config).unwrap();
        assert_eq!(sensor.id(), 7);
        assert_relative_eq!(sensor.pose().forward().into_inner(), -Vector3::x(), epsilon = 1e-12);

        let broken = SensorConfig {
            forward: [0.0, 0.0, 0.0],
            ..SensorConfig::default()
        };
        assert!(OpticalSensor::from_config(&broken).is_err());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(InvalidReason::Occluded.to_string(), "occluded");
        assert_eq!(
            InvalidReason::OutOfRange { distance: 21.0 }.to_string(),
            "out of range (21.00 m)"
        );
    }
}
