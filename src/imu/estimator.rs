//! Low-pass inertial estimator.
//!
//! Per tick, given linear and angular rates:
//! 1. raw acceleration = (velocity - last velocity) / dt, plus isotropic noise
//! 2. filtered acceleration = lerp(filtered, raw, alpha)
//! 3. velocity = lerp(last velocity, raw velocity, alpha)
//! 4. angular velocity = lerp(last, raw + noise, alpha)
//! 5. orientation advanced by `exp(ω dt)` (world-frame delta, left-multiplied)
//! 6. drift correction: near-stationary velocity decays towards zero, and
//!    orientation is slerped towards the reference orientation by
//!    `drift_correction * dt`
//!
//! Step 6 bounds the integration drift of the simulated sensor. It also means
//! this is not a pure inertial integrator: it peeks at ground truth.

use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::differentiator::PoseDifferentiator;
use super::sample::{GRAVITY, MotionSample, RateSample};
use crate::geometry::Pose;

/// Tuning of the inertial estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InertialConfig {
    /// Magnitude of the additive acceleration noise (m/s²).
    pub acceleration_noise: f64,
    /// Magnitude of the additive angular-rate noise (rad/s).
    pub angular_noise: f64,
    /// Low-pass blend factor in [0, 1]. 1 disables smoothing.
    pub low_pass_alpha: f64,
    /// Drift-correction strength in [0, 1], applied per second.
    pub drift_correction: f64,
    /// Speed (m/s) below which velocity is relaxed towards zero.
    pub stationary_speed: f64,
    /// Added to the filtered acceleration to produce the reported linear
    /// acceleration (what an accelerometer at rest reads).
    pub gravity_compensation: [f64; 3],
    /// Seed for the noise generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for InertialConfig {
    fn default() -> Self {
        Self {
            acceleration_noise: 0.05,
            angular_noise: 0.01,
            low_pass_alpha: 0.5,
            drift_correction: 0.05,
            stationary_speed: 0.05,
            gravity_compensation: [-GRAVITY.x, -GRAVITY.y, -GRAVITY.z],
            seed: None,
        }
    }
}

impl InertialConfig {
    /// Noise-free, unsmoothed, uncorrected: output equals raw rates.
    pub fn ideal() -> Self {
        Self {
            acceleration_noise: 0.0,
            angular_noise: 0.0,
            low_pass_alpha: 1.0,
            drift_correction: 0.0,
            stationary_speed: 0.0,
            seed: Some(0),
            ..Self::default()
        }
    }
}

/// Filtered inertial quantities, all in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialState {
    pub filtered_acceleration: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// Scaled-axis angular velocity (rad/s).
    pub angular_velocity: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl InertialState {
    pub fn at_rest(orientation: UnitQuaternion<f64>) -> Self {
        Self {
            filtered_acceleration: Vector3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            orientation,
        }
    }
}

/// Inertial sensor rigidly attached to the target.
pub struct InertialEstimator {
    config: InertialConfig,
    state: InertialState,
    differentiator: PoseDifferentiator,
    rng: StdRng,
}

impl InertialEstimator {
    pub fn new(config: InertialConfig, initial: Pose) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: InertialState::at_rest(initial.orientation),
            differentiator: PoseDifferentiator::new(initial),
            rng,
        }
    }

    pub fn config(&self) -> &InertialConfig {
        &self.config
    }

    pub fn state(&self) -> &InertialState {
        &self.state
    }

    /// Filtered acceleration plus gravity compensation.
    pub fn linear_acceleration(&self) -> Vector3<f64> {
        self.state.filtered_acceleration + Vector3::from(self.config.gravity_compensation)
    }

    /// Start over at rest at `pose`.
    pub fn reset(&mut self, pose: Pose) {
        self.state = InertialState::at_rest(pose.orientation);
        self.differentiator.reset(pose);
    }

    /// Feed one ground-truth sample. Returns `false` (and changes nothing)
    /// for `dt <= 0`.
    pub fn update(&mut self, sample: &MotionSample) -> bool {
        match self.differentiator.differentiate(sample) {
            Some(rates) => {
                self.integrate(&rates);
                true
            }
            None => false,
        }
    }

    /// A tick passed without a ground-truth sample. The state is held and the
    /// elapsed time is folded into the next sample's interval.
    pub fn skip(&mut self, dt: f64) {
        self.differentiator.skip(dt);
    }

    /// Integrate one tick of rates. A non-positive `dt` is a no-op.
    pub fn integrate(&mut self, rates: &RateSample) {
        let dt = rates.dt;
        if dt <= 0.0 {
            return;
        }
        let alpha = self.config.low_pass_alpha;
        let last = self.state;

        let raw_acceleration = (rates.velocity - last.velocity) / dt
            + self.noise(self.config.acceleration_noise);
        let filtered_acceleration = last.filtered_acceleration.lerp(&raw_acceleration, alpha);
        let mut velocity = last.velocity.lerp(&rates.velocity, alpha);

        let raw_angular = rates.angular_velocity + self.noise(self.config.angular_noise);
        let angular_velocity = last.angular_velocity.lerp(&raw_angular, alpha);
        let mut orientation =
            UnitQuaternion::from_scaled_axis(angular_velocity * dt) * last.orientation;

        let k = (self.config.drift_correction * dt).clamp(0.0, 1.0);
        if k > 0.0 {
            if velocity.norm() < self.config.stationary_speed {
                velocity = velocity.lerp(&Vector3::zeros(), k);
            }
            if let Some(reference) = rates.reference_orientation {
                // Undefined for exactly opposite rotations; keep the integrated one then.
                orientation = orientation
                    .try_slerp(&reference, k, 1e-9)
                    .unwrap_or(orientation);
            }
        }

        self.state = InertialState {
            filtered_acceleration,
            velocity,
            angular_velocity,
            orientation,
        };
    }

    /// Uniform sample inside a ball of radius `magnitude`.
    fn noise(&mut self, magnitude: f64) -> Vector3<f64> {
        if magnitude <= 0.0 {
            return Vector3::zeros();
        }
        loop {
            let v = Vector3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            if v.norm_squared() <= 1.0 {
                return v * magnitude;
            }
        }
    }
}
