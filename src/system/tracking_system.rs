//! Tracking system: one target's full per-tick pipeline.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::TrackerConfig;
use crate::geometry::Pose;
use crate::imu::{InertialEstimator, MotionSample};
use crate::optical::{BearingReading, Occluder, OpticalSensor};
use crate::tracking::{FusionController, FusionResult, TimingStats};

/// Sensors + inertial estimator + fusion controller for one target.
pub struct TrackingSystem {
    sensors: Vec<OpticalSensor>,
    inertial: InertialEstimator,
    fusion: FusionController,
    ticks: u64,
}

impl TrackingSystem {
    pub fn new(
        sensors: Vec<OpticalSensor>,
        inertial: InertialEstimator,
        fusion: FusionController,
    ) -> Self {
        Self {
            sensors,
            inertial,
            fusion,
            ticks: 0,
        }
    }

    /// Build from configuration with the target starting at `initial`.
    pub fn from_config(config: &TrackerConfig, initial: Pose) -> Result<Self> {
        config.validate()?;
        let sensors = config
            .sensors
            .iter()
            .map(|s| {
                OpticalSensor::from_config(s)
                    .with_context(|| format!("Failed to build sensor {}", s.id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            sensors,
            InertialEstimator::new(config.inertial.clone(), initial),
            FusionController::new(config.fusion.clone(), initial),
        ))
    }

    pub fn sensors(&self) -> &[OpticalSensor] {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut [OpticalSensor] {
        &mut self.sensors
    }

    pub fn inertial(&self) -> &InertialEstimator {
        &self.inertial
    }

    pub fn fusion(&self) -> &FusionController {
        &self.fusion
    }

    /// Current fused pose.
    pub fn pose(&self) -> Pose {
        self.fusion.state().pose()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Put the target back at `pose`, at rest, not tracking.
    pub fn reset(&mut self, pose: Pose) {
        self.inertial.reset(pose);
        self.fusion.reset(pose);
    }

    /// Run one tick.
    ///
    /// `target` is the true target pose, or `None` when the target reference
    /// is missing (every sensor then reports invalid and the inertial
    /// estimator is not fed). A non-positive `dt` leaves the inertial state
    /// untouched and does not move the dead-reckoned position.
    pub fn tick<O: Occluder + ?Sized>(
        &mut self,
        dt: f64,
        target: Option<&Pose>,
        occluder: &O,
    ) -> FusionResult {
        let t_start = Instant::now();
        self.ticks += 1;

        match target {
            Some(pose) => {
                self.inertial.update(&MotionSample::new(*pose, dt));
            }
            None => self.inertial.skip(dt),
        }

        let target_position = target.map(|p| &p.position);
        let readings: Vec<BearingReading> = self
            .sensors
            .iter()
            .map(|s| s.observe(target_position, occluder))
            .collect();
        let sensors_ms = t_start.elapsed().as_secs_f64() * 1000.0;

        let t_fusion = Instant::now();
        let inertial = *self.inertial.state();
        let output = self.fusion.update(dt, &readings, &inertial);
        let fusion_ms = t_fusion.elapsed().as_secs_f64() * 1000.0;

        let position_error = target.map(|p| (output.pose.position - p.position).norm());

        debug!(
            "[Tick {}] mode={:?} valid={}/{} pos=[{:.3}, {:.3}, {:.3}] err={:?}",
            self.ticks,
            output.mode,
            output.valid_sensors,
            readings.len(),
            output.pose.position.x,
            output.pose.position.y,
            output.pose.position.z,
            position_error
        );

        FusionResult {
            tick: self.ticks,
            pose: output.pose,
            mode: output.mode,
            event: output.event,
            readings,
            valid_sensors: output.valid_sensors,
            triangulation: output.triangulation,
            inertial,
            linear_acceleration: self.inertial.linear_acceleration(),
            position_error,
            time_since_fix: output.time_since_fix,
            timing: TimingStats {
                total_ms: t_start.elapsed().as_secs_f64() * 1000.0,
                sensors_ms,
                fusion_ms,
            },
        }
    }
}
