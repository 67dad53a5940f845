use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::imu::InertialConfig;
use crate::optical::SensorConfig;
use crate::tracking::FusionConfig;
use crate::tracking::triangulation::MIN_RAYS;

/// Complete configuration for one tracked target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub inertial: InertialConfig,
    pub fusion: FusionConfig,
    pub sensors: Vec<SensorConfig>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inertial: InertialConfig::default(),
            fusion: FusionConfig::default(),
            sensors: default_sensors(),
        }
    }
}

/// Three ceiling-height sensors around a 8 m room, aimed at head height in
/// the middle.
fn default_sensors() -> Vec<SensorConfig> {
    let aim = [0.0, 1.5, 0.0];
    [[4.0, 2.5, 4.0], [-4.0, 2.5, 4.0], [0.0, 2.5, -4.0]]
        .into_iter()
        .enumerate()
        .map(|(i, position)| SensorConfig {
            id: i as u32,
            position,
            forward: [
                aim[0] - position[0],
                aim[1] - position[1],
                aim[2] - position[2],
            ],
            ..SensorConfig::default()
        })
        .collect()
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value >= 0.0 && value.is_finite()) {
        bail!("{} must be finite and non-negative, got {}", name, value);
    }
    Ok(())
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{} must be in [0, 1], got {}", name, value);
    }
    Ok(())
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        let inertial = &self.inertial;
        check_unit_interval("inertial.low_pass_alpha", inertial.low_pass_alpha)?;
        check_unit_interval("inertial.drift_correction", inertial.drift_correction)?;
        check_non_negative("inertial.acceleration_noise", inertial.acceleration_noise)?;
        check_non_negative("inertial.angular_noise", inertial.angular_noise)?;
        check_non_negative("inertial.stationary_speed", inertial.stationary_speed)?;
        if !inertial.gravity_compensation.iter().all(|c| c.is_finite()) {
            bail!(
                "inertial.gravity_compensation must be finite, got {:?}",
                inertial.gravity_compensation
            );
        }

        check_unit_interval("fusion.optical_weight", self.fusion.optical_weight)?;
        if self.fusion.min_sensors < MIN_RAYS {
            bail!(
                "fusion.min_sensors must be at least {}, got {}",
                MIN_RAYS,
                self.fusion.min_sensors
            );
        }

        let mut ids = HashSet::new();
        for sensor in &self.sensors {
            if !ids.insert(sensor.id) {
                bail!("duplicate sensor id {}", sensor.id);
            }
            for (name, fov) in [
                ("horizontal_fov_deg", sensor.horizontal_fov_deg),
                ("vertical_fov_deg", sensor.vertical_fov_deg),
            ] {
                if !(fov > 0.0 && fov <= 180.0) {
                    bail!("sensor {} {} must be in (0, 180], got {}", sensor.id, name, fov);
                }
            }
            if !(sensor.max_range > 0.0) {
                bail!("sensor {} max_range must be positive", sensor.id);
            }
            if sensor.forward.iter().all(|c| *c == 0.0) {
                bail!("sensor {} has a zero forward axis", sensor.id);
            }
        }
        Ok(())
    }
}
