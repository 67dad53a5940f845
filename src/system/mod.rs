//! Per-target pipeline orchestration.
//!
//! The `TrackingSystem` owns everything one tracked target needs: the fixed
//! optical sensors, the inertial estimator and the fusion controller. Ticks
//! are synchronous; several targets are tracked with several independent
//! systems that share no mutable state.

mod tracking_system;

pub use tracking_system::TrackingSystem;
