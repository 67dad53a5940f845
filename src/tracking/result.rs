//! Per-tick result snapshot.
//!
//! Everything an external renderer or status panel needs:
//! - fused pose and the mode that produced it
//! - tracking event, if the mode changed this tick
//! - every sensor's reading (validity, reason, angles)
//! - inertial state and triangulation diagnostics
//! - error against ground truth when the caller knows it

use std::fmt;

use nalgebra::Vector3;

use crate::geometry::Pose;
use crate::imu::InertialState;
use crate::optical::BearingReading;
use crate::tracking::triangulation::TriangulationEstimate;
use crate::tracking::{FusionMode, TrackingEvent};

/// Summary of one tick.
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// Ticks processed so far, this one included.
    pub tick: u64,
    pub pose: Pose,
    pub mode: FusionMode,
    pub event: Option<TrackingEvent>,
    pub readings: Vec<BearingReading>,
    pub valid_sensors: usize,
    pub triangulation: Option<TriangulationEstimate>,
    pub inertial: InertialState,
    /// Filtered acceleration plus gravity compensation.
    pub linear_acceleration: Vector3<f64>,
    /// Distance between the fused and the true position (m), if known.
    pub position_error: Option<f64>,
    pub time_since_fix: Option<f64>,
    pub timing: TimingStats,
}

impl FusionResult {
    /// One `✓`/`×` per sensor, in reading order.
    pub fn sensor_marks(&self) -> String {
        self.readings
            .iter()
            .map(|r| if r.is_valid() { '✓' } else { '×' })
            .collect()
    }
}

impl fmt::Display for FusionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.pose.position;
        let (roll, pitch, yaw) = self.pose.orientation.euler_angles();
        write!(
            f,
            "#{} {:?} pos=[{:.2}, {:.2}, {:.2}] rpy=[{:.1}, {:.1}, {:.1}]° sensors={}",
            self.tick,
            self.mode,
            p.x,
            p.y,
            p.z,
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees(),
            self.sensor_marks()
        )?;
        if let Some(err) = self.position_error {
            write!(f, " err={:.3}m", err)?;
        }
        if let Some(event) = self.event {
            write!(f, " [{:?}]", event)?;
        }
        Ok(())
    }
}

/// Timing for a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    pub total_ms: f64,
    pub sensors_ms: f64,
    pub fusion_ms: f64,
}

impl TimingStats {
    pub fn zero() -> Self {
        Self {
            total_ms: 0.0,
            sensors_ms: 0.0,
            fusion_ms: 0.0,
        }
    }
}
