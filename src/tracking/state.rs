//! Fusion mode and tracking events.

/// Which source produced this tick's position.
///
/// Selected fresh every tick from the number of valid optical readings; it is
/// not latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMode {
    /// Position triangulated from at least the configured number of sensors.
    Optical,
    /// Too few sensors: position dead-reckoned from inertial velocity.
    Inertial,
}

impl Default for FusionMode {
    fn default() -> Self {
        Self::Inertial
    }
}

/// Edge-triggered notification for external collaborators (audio cue, log).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    /// Optical → Inertial.
    Lost,
    /// Inertial → Optical.
    Regained,
}
