//! Fixed angle-only optical sensors and the scene obstructions that can hide
//! the target from them.

pub mod occlusion;
pub mod sensor;

pub use occlusion::{Aabb, NoObstructions, Obstruction, ObstructionSet, Occluder, Wall};
pub use sensor::{BearingReading, InvalidReason, Observation, OpticalSensor, SensorConfig};
