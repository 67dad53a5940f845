//! Tracking: turns per-sensor bearings and the inertial state into a fused
//! pose each tick.
//!
//! - Triangulation of valid bearing rays (pairwise closest points)
//! - Dead-reckoning fallback between optical fixes
//! - Fusion controller with an Optical/Inertial mode and tracking events
//! - Per-tick result snapshot for external renderers

pub mod dead_reckoning;
pub mod fusion;
pub mod result;
pub mod state;
pub mod triangulation;

pub use dead_reckoning::DeadReckoner;
pub use fusion::{FusionConfig, FusionController, FusionOutput, FusionState, OrientationSource};
pub use result::{FusionResult, TimingStats};
pub use state::{FusionMode, TrackingEvent};
pub use triangulation::{
    TriangulationEngine, TriangulationError, TriangulationEstimate, TriangulationOutcome,
    ray_from_reading, triangulate,
};
