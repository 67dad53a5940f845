//! Inertial sensing: motion samples, the rate adapter boundary and the
//! low-pass inertial estimator.

pub mod differentiator;
pub mod estimator;
pub mod sample;

pub use differentiator::PoseDifferentiator;
pub use estimator::{InertialConfig, InertialEstimator, InertialState};
pub use sample::{GRAVITY, MotionSample, RateSample};
