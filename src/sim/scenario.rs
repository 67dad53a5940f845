//! End-to-end scenario runner.

use std::fmt;

use anyhow::{Result, bail};
use tracing::info;

use super::motion::ScriptedMotion;
use crate::config::TrackerConfig;
use crate::geometry::Pose;
use crate::imu::MotionSample;
use crate::optical::{Obstruction, ObstructionSet, Wall};
use crate::system::TrackingSystem;
use crate::tracking::{FusionMode, FusionResult, TrackingEvent};

/// Upper bound on the samples one scripted run may generate.
const MAX_SCRIPTED_SAMPLES: f64 = 1e7;

/// Set the wall to `height` once simulated time reaches `at` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallChange {
    pub at: f64,
    pub height: f64,
}

/// Aggregate statistics of a run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub ticks: usize,
    pub optical_ticks: usize,
    pub lost_events: usize,
    pub regained_events: usize,
    pub rms_error: f64,
    pub max_error: f64,
    /// Largest error seen while in the Optical mode.
    pub max_optical_error: f64,
    pub last: Option<FusionResult>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks ({} optical), lost {}x, regained {}x, rms error {:.4} m, max error {:.4} m (optical {:.6} m)",
            self.ticks,
            self.optical_ticks,
            self.lost_events,
            self.regained_events,
            self.rms_error,
            self.max_error,
            self.max_optical_error
        )
    }
}

/// A room with the configured sensors and a wall between the +Z sensors
/// and the walking area.
pub struct Scenario {
    config: TrackerConfig,
    scene: ObstructionSet,
    wall: usize,
    wall_changes: Vec<WallChange>,
    motion: ScriptedMotion,
}

impl Scenario {
    pub fn room(config: TrackerConfig) -> Self {
        let mut scene = ObstructionSet::new();
        let wall = scene.push(Obstruction::Wall(Wall::new((-5.0, 2.4), (5.0, 2.6), 0.0, 0.0)));
        Self {
            config,
            scene,
            wall,
            wall_changes: Vec::new(),
            motion: ScriptedMotion::default(),
        }
    }

    pub fn with_motion(mut self, motion: ScriptedMotion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_wall_change(mut self, at: f64, height: f64) -> Self {
        self.wall_changes.push(WallChange { at, height });
        self.wall_changes.sort_by(|a, b| a.at.total_cmp(&b.at));
        self
    }

    pub fn scene(&self) -> &ObstructionSet {
        &self.scene
    }

    pub fn motion(&self) -> &ScriptedMotion {
        &self.motion
    }

    /// Drive the tracker along the scripted motion.
    pub fn run(&mut self, dt: f64, duration: f64) -> Result<ScenarioReport> {
        if !(dt > 0.0 && dt.is_finite()) {
            bail!("scenario time step must be positive, got {}", dt);
        }
        if !(duration >= 0.0 && duration.is_finite()) {
            bail!("scenario duration must be finite and non-negative, got {}", duration);
        }
        if (duration / dt).round() > MAX_SCRIPTED_SAMPLES {
            bail!(
                "scenario of {} s at {} s steps exceeds {} samples",
                duration,
                dt,
                MAX_SCRIPTED_SAMPLES
            );
        }
        let samples = self.motion.samples(dt, duration);
        self.replay(self.motion.pose_at(0.0), &samples)
    }

    /// Drive the tracker with recorded samples, starting at `initial`.
    pub fn replay(&mut self, initial: Pose, samples: &[MotionSample]) -> Result<ScenarioReport> {
        self.replay_with(initial, samples, |_| {})
    }

    /// Like [`Scenario::replay`], handing every tick result to `on_tick`.
    pub fn replay_with<F>(
        &mut self,
        initial: Pose,
        samples: &[MotionSample],
        mut on_tick: F,
    ) -> Result<ScenarioReport>
    where
        F: FnMut(&FusionResult),
    {
        let mut system = TrackingSystem::from_config(&self.config, initial)?;
        let mut pending = self.wall_changes.iter().peekable();
        let mut t = 0.0;

        let mut report = ScenarioReport {
            ticks: 0,
            optical_ticks: 0,
            lost_events: 0,
            regained_events: 0,
            rms_error: 0.0,
            max_error: 0.0,
            max_optical_error: 0.0,
            last: None,
        };
        let mut sum_sq = 0.0;

        for sample in samples {
            t += sample.dt.max(0.0);
            while let Some(change) = pending.next_if(|c| c.at <= t) {
                if let Some(wall) = self.scene.wall_mut(self.wall) {
                    wall.set_height(change.height);
                    info!(t, height = wall.height(), "Wall height changed");
                }
            }

            let result = system.tick(sample.dt, Some(&sample.pose), &self.scene);

            report.ticks += 1;
            let error = result.position_error.unwrap_or(0.0);
            sum_sq += error * error;
            report.max_error = report.max_error.max(error);
            if result.mode == FusionMode::Optical {
                report.optical_ticks += 1;
                report.max_optical_error = report.max_optical_error.max(error);
            }
            match result.event {
                Some(TrackingEvent::Lost) => report.lost_events += 1,
                Some(TrackingEvent::Regained) => report.regained_events += 1,
                None => {}
            }
            on_tick(&result);
            report.last = Some(result);
        }

        if report.ticks > 0 {
            report.rms_error = (sum_sq / report.ticks as f64).sqrt();
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config() -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.inertial.seed = Some(1);
        config
    }

    #[test]
    fn test_open_room_tracks_optically() {
        let report = Scenario::room(seeded_config()).run(0.02, 2.0).unwrap();

        assert_eq!(report.ticks, 100);
        assert_eq!(report.optical_ticks, 100);
        assert_eq!(report.lost_events, 0);
        assert_eq!(report.regained_events, 1);
        assert!(report.max_error < 1e-6);
    }

    #[test]
    fn test_raised_wall_forces_dead_reckoning() {
        let mut scenario = Scenario::room(seeded_config()).with_wall_change(1.0, Wall::MAX_HEIGHT);
        let report = scenario.run(0.02, 3.0).unwrap();

        assert_eq!(report.lost_events, 1);
        assert_eq!(report.regained_events, 1);
        assert!((48..=51).contains(&report.optical_ticks));
        assert!(report.max_optical_error < 1e-6);
        assert!(report.max_error > report.max_optical_error);

        let last = report.last.unwrap();
        assert_eq!(last.mode, FusionMode::Inertial);
        assert_eq!(last.valid_sensors, 1);
        assert_eq!(last.sensor_marks(), "××✓");
        assert_eq!(scenario.scene().iter().count(), 1);
    }

    #[test]
    fn test_lowering_wall_regains_tracking() {
        let mut scenario = Scenario::room(seeded_config())
            .with_wall_change(1.5, 0.0)
            .with_wall_change(0.5, 3.0);
        let report = scenario.run(0.02, 2.5).unwrap();

        assert_eq!(report.lost_events, 1);
        assert_eq!(report.regained_events, 2);
        assert_eq!(report.last.unwrap().mode, FusionMode::Optical);
    }

    #[test]
    fn test_replay_reports_every_tick() {
        let motion = ScriptedMotion::default();
        let samples = motion.samples(0.05, 1.0);
        let mut seen = Vec::new();
        let report = Scenario::room(seeded_config())
            .replay_with(motion.pose_at(0.0), &samples, |r| seen.push(r.tick))
            .unwrap();

        assert_eq!(report.ticks, 20);
        assert_eq!(seen, (1..=20).collect::<Vec<u64>>());
    }

    #[test]
    fn test_rejects_non_positive_step() {
        assert!(Scenario::room(seeded_config()).run(0.0, 1.0).is_err());
        assert!(Scenario::room(seeded_config()).run(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_duration() {
        let mut scenario = Scenario::room(seeded_config());
        assert!(scenario.run(0.02, -1.0).is_err());
        assert!(scenario.run(0.02, f64::NAN).is_err());
        assert!(scenario.run(0.02, f64::INFINITY).is_err());
        assert!(scenario.run(1e-9, 1e6).is_err());

        let report = scenario.run(0.02, 0.0).unwrap();
        assert_eq!(report.ticks, 0);
    }

    #[test]
    fn test_report_display() {
        let report = Scenario::room(seeded_config()).run(0.1, 0.5).unwrap();
        assert!(report.to_string().starts_with("5 ticks (5 optical), lost 0x, regained 1x"));
    }
}
