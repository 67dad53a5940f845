//! Simulation harness: scripted target motion and a ready-made room with
//! three sensors and a height-adjustable wall.

pub mod motion;
pub mod scenario;

pub use motion::ScriptedMotion;
pub use scenario::{Scenario, ScenarioReport, WallChange};
