//! Optical/inertial fusion controller.
//!
//! Each tick:
//! - at least `min_sensors` valid readings: **Optical**. Position is the
//!   triangulated one (optionally blended with the dead-reckoned prediction),
//!   orientation comes from the configured [`OrientationSource`].
//! - otherwise: **Inertial**. Position is dead-reckoned from the last fused
//!   position with the inertial velocity, orientation is the inertial one.
//!
//! Mode changes emit a one-shot [`TrackingEvent`].

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::dead_reckoning::DeadReckoner;
use super::state::{FusionMode, TrackingEvent};
use super::triangulation::{TriangulationEngine, TriangulationEstimate, TriangulationOutcome};
use crate::geometry::Pose;
use crate::imu::InertialState;
use crate::optical::BearingReading;

/// Where the Optical mode takes its orientation from. Bearings carry no
/// orientation information, so this is a policy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationSource {
    /// Use the inertial estimator's orientation.
    Inertial,
    /// Keep the last fused orientation.
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Valid readings needed for the Optical mode (>= 2).
    pub min_sensors: usize,
    /// Optical share in [0, 1] when blending the triangulated position with
    /// the dead-reckoned prediction. 1 uses the triangulated position as is.
    pub optical_weight: f64,
    pub orientation_source: OrientationSource,
    /// When false, no reading counts as valid.
    pub optical_enabled: bool,
    /// When false, the Inertial mode holds the last fused pose.
    pub inertial_enabled: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_sensors: 2,
            optical_weight: 1.0,
            orientation_source: OrientationSource::Inertial,
            optical_enabled: true,
            inertial_enabled: true,
        }
    }
}

/// Fused estimate carried from tick to tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionState {
    pub estimated_position: Vector3<f64>,
    pub estimated_orientation: UnitQuaternion<f64>,
    pub was_tracking_optically: bool,
}

impl FusionState {
    pub fn pose(&self) -> Pose {
        Pose::new(self.estimated_position, self.estimated_orientation)
    }
}

/// What one fusion tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutput {
    pub pose: Pose,
    pub mode: FusionMode,
    pub event: Option<TrackingEvent>,
    /// Valid readings that counted this tick.
    pub valid_sensors: usize,
    pub triangulation: Option<TriangulationEstimate>,
    /// Seconds of dead-reckoning since the last optical fix.
    pub time_since_fix: Option<f64>,
}

/// Owns the fused state for one target.
pub struct FusionController {
    config: FusionConfig,
    state: FusionState,
    triangulation: TriangulationEngine,
    reckoner: DeadReckoner,
}

impl FusionController {
    /// Start from a known pose, not yet tracking optically.
    pub fn new(config: FusionConfig, initial: Pose) -> Self {
        Self {
            config,
            state: FusionState {
                estimated_position: initial.position,
                estimated_orientation: initial.orientation,
                was_tracking_optically: false,
            },
            triangulation: TriangulationEngine::new(),
            reckoner: DeadReckoner::new(),
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn state(&self) -> &FusionState {
        &self.state
    }

    pub fn triangulation(&self) -> &TriangulationEngine {
        &self.triangulation
    }

    /// Re-seed the estimate, e.g. after relocating the target.
    pub fn reset(&mut self, pose: Pose) {
        self.state = FusionState {
            estimated_position: pose.position,
            estimated_orientation: pose.orientation,
            was_tracking_optically: false,
        };
        self.triangulation.reset();
        self.reckoner.reset();
    }

    pub fn update(
        &mut self,
        dt: f64,
        readings: &[BearingReading],
        inertial: &InertialState,
    ) -> FusionOutput {
        let valid_sensors = if self.config.optical_enabled {
            readings.iter().filter(|r| r.is_valid()).count()
        } else {
            0
        };

        let triangulation = if valid_sensors >= self.config.min_sensors {
            match self.triangulation.update(readings) {
                TriangulationOutcome::Updated(estimate) => Some(estimate),
                TriangulationOutcome::NoUpdate { .. } => None,
            }
        } else {
            None
        };

        let (mode, position, orientation) = match triangulation {
            Some(estimate) => {
                let predicted = if self.config.inertial_enabled {
                    DeadReckoner::extrapolate(&self.state.estimated_position, &inertial.velocity, dt)
                } else {
                    self.state.estimated_position
                };
                let position = predicted.lerp(&estimate.position, self.config.optical_weight);
                let orientation = match self.config.orientation_source {
                    OrientationSource::Inertial if self.config.inertial_enabled => {
                        inertial.orientation
                    }
                    _ => self.state.estimated_orientation,
                };
                self.reckoner.fix(position);
                (FusionMode::Optical, position, orientation)
            }
            None if self.config.inertial_enabled => {
                let position = self.reckoner.advance(
                    &self.state.estimated_position,
                    &inertial.velocity,
                    dt,
                );
                (FusionMode::Inertial, position, inertial.orientation)
            }
            None => (
                FusionMode::Inertial,
                self.state.estimated_position,
                self.state.estimated_orientation,
            ),
        };

        let tracking = mode == FusionMode::Optical;
        let event = match (self.state.was_tracking_optically, tracking) {
            (true, false) => {
                warn!(
                    "Optical tracking lost ({} valid sensors, need {}), dead-reckoning",
                    valid_sensors, self.config.min_sensors
                );
                Some(TrackingEvent::Lost)
            }
            (false, true) => {
                info!("Optical tracking acquired with {} sensors", valid_sensors);
                Some(TrackingEvent::Regained)
            }
            _ => None,
        };

        self.state = FusionState {
            estimated_position: position,
            estimated_orientation: orientation,
            was_tracking_optically: tracking,
        };

        FusionOutput {
            pose: self.state.pose(),
            mode,
            event,
            valid_sensors,
            triangulation,
            time_since_fix: self.reckoner.time_since_fix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optical::{NoObstructions, OpticalSensor};
    use approx::assert_relative_eq;

    const TARGET: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);

    fn sensors() -> Vec<OpticalSensor> {
        [
            Vector3::new(5.0, 2.0, 0.0),
            Vector3::new(-5.0, 2.0, 1.0),
            Vector3::new(0.0, 2.5, -5.0),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let pose = Pose::looking_along(p, TARGET - p).unwrap();
            OpticalSensor::new(i as u32, pose, 90.0, 60.0, 20.0)
        })
        .collect()
    }

    /// Readings where the first `visible` sensors see `target`.
    fn readings(visible: usize, target: &Vector3<f64>) -> Vec<BearingReading> {
        sensors()
            .iter()
            .enumerate()
            .map(|(i, s)| s.observe((i < visible).then_some(target), &NoObstructions))
            .collect()
    }

    fn moving(velocity: Vector3<f64>) -> InertialState {
        InertialState {
            velocity,
            ..InertialState::at_rest(UnitQuaternion::identity())
        }
    }

    #[test]
    fn test_mode_follows_sensor_count() {
        let start = Pose::new(Vector3::new(9.0, 9.0, 9.0), UnitQuaternion::identity());
        let mut fusion = FusionController::new(FusionConfig::default(), start);
        let imu = moving(Vector3::zeros());

        for visible in [0, 1] {
            let out = fusion.update(0.1, &readings(visible, &TARGET), &imu);
            assert_eq!(out.mode, FusionMode::Inertial);
            assert_eq!(out.valid_sensors, visible);
        }
        for visible in [2, 3] {
            let out = fusion.update(0.1, &readings(visible, &TARGET), &imu);
            assert_eq!(out.mode, FusionMode::Optical);
            assert_relative_eq!(out.pose.position, TARGET, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_threshold_of_three() {
        let config = FusionConfig {
            min_sensors: 3,
            ..FusionConfig::default()
        };
        let mut fusion = FusionController::new(config, Pose::identity());
        let imu = moving(Vector3::zeros());

        assert_eq!(fusion.update(0.1, &readings(2, &TARGET), &imu).mode, FusionMode::Inertial);
        assert_eq!(fusion.update(0.1, &readings(3, &TARGET), &imu).mode, FusionMode::Optical);
    }

    #[test]
    fn test_lost_fires_once_per_transition() {
        let mut fusion = FusionController::new(FusionConfig::default(), Pose::identity());
        let imu = moving(Vector3::zeros());
        let script = [3, 3, 1, 0, 1, 2, 3, 0, 0, 0];

        let events: Vec<_> = script
            .iter()
            .map(|&n| fusion.update(0.1, &readings(n, &TARGET), &imu).event)
            .collect();

        assert_eq!(
            events,
            vec![
                Some(TrackingEvent::Regained),
                None,
                Some(TrackingEvent::Lost),
                None,
                None,
                Some(TrackingEvent::Regained),
                None,
                Some(TrackingEvent::Lost),
                None,
                None,
            ]
        );
        assert!(!fusion.state().was_tracking_optically);
    }

    #[test]
    fn test_no_lost_event_when_never_tracked() {
        let mut fusion = FusionController::new(FusionConfig::default(), Pose::identity());
        let imu = moving(Vector3::zeros());
        for _ in 0..5 {
            assert_eq!(fusion.update(0.1, &readings(0, &TARGET), &imu).event, None);
        }
    }

    #[test]
    fn test_dead_reckons_from_last_fix() {
        let mut fusion = FusionController::new(FusionConfig::default(), Pose::identity());
        let v = Vector3::new(1.0, 0.0, -0.5);

        fusion.update(0.1, &readings(3, &TARGET), &moving(v));
        let mut expected = TARGET;
        for k in 1..=5 {
            let out = fusion.update(0.1, &readings(1, &TARGET), &moving(v));
            expected += v * 0.1;
            assert_eq!(out.mode, FusionMode::Inertial);
            assert_relative_eq!(out.pose.position, expected, epsilon = 1e-9);
            assert_relative_eq!(out.time_since_fix.unwrap(), 0.1 * k as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_blend_weight() {
        let config = FusionConfig {
            optical_weight: 0.7,
            ..FusionConfig::default()
        };
        let start = Pose::new(Vector3::new(1.0, 1.0, 0.0), UnitQuaternion::identity());
        let mut fusion = FusionController::new(config, start);
        let v = Vector3::new(0.0, 0.0, 2.0);

        let out = fusion.update(0.5, &readings(3, &TARGET), &moving(v));
        let predicted = Vector3::new(1.0, 1.0, 1.0);
        assert_relative_eq!(out.pose.position, predicted * 0.3 + TARGET * 0.7, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_policies() {
        let start_q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.3);
        let imu_q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -0.8);
        let imu = InertialState::at_rest(imu_q);
        let start = Pose::new(Vector3::zeros(), start_q);

        let mut inertial = FusionController::new(FusionConfig::default(), start);
        assert_eq!(inertial.update(0.1, &readings(3, &TARGET), &imu).pose.orientation, imu_q);

        let hold = FusionConfig {
            orientation_source: OrientationSource::Hold,
            ..FusionConfig::default()
        };
        let mut holding = FusionController::new(hold, start);
        assert_eq!(holding.update(0.1, &readings(3, &TARGET), &imu).pose.orientation, start_q);
        // The Inertial mode always follows the inertial estimator.
        assert_eq!(holding.update(0.1, &readings(0, &TARGET), &imu).pose.orientation, imu_q);
    }

    #[test]
    fn test_disabled_sources() {
        let no_optical = FusionConfig {
            optical_enabled: false,
            ..FusionConfig::default()
        };
        let mut fusion = FusionController::new(no_optical, Pose::identity());
        let out = fusion.update(0.1, &readings(3, &TARGET), &moving(Vector3::x()));
        assert_eq!(out.mode, FusionMode::Inertial);
        assert_eq!(out.valid_sensors, 0);

        let no_inertial = FusionConfig {
            inertial_enabled: false,
            ..FusionConfig::default()
        };
        let start = Pose::new(Vector3::new(2.0, 0.0, 0.0), UnitQuaternion::identity());
        let mut fusion = FusionController::new(no_inertial, start);
        let out = fusion.update(0.1, &readings(1, &TARGET), &moving(Vector3::x()));
        assert_eq!(out.pose, start);
    }

    #[test]
    fn test_reset() {
        let mut fusion = FusionController::new(FusionConfig::default(), Pose::identity());
        fusion.update(0.1, &readings(3, &TARGET), &moving(Vector3::zeros()));
        assert!(fusion.triangulation().last_estimate().is_some());

        let home = Pose::new(Vector3::new(1.0, 2.0, 3.0), UnitQuaternion::identity());
        fusion.reset(home);
        assert_eq!(fusion.state().pose(), home);
        assert!(!fusion.state().was_tracking_optically);
        assert!(fusion.triangulation().last_estimate().is_none());
    }
}
