use anyhow::{Result, bail};
use tracing::info;

use rust_pose_fusion::config::{TrackerConfig, load_config};
use rust_pose_fusion::io::load_motion_csv;
use rust_pose_fusion::optical::Wall;
use rust_pose_fusion::sim::Scenario;
use rust_pose_fusion::tracking::FusionResult;

const DT: f64 = 0.02;
const DURATION_S: f64 = 12.0;
const WALL_UP_AT_S: f64 = 4.0;
const WALL_DOWN_AT_S: f64 = 8.0;

/// Usage: `rust_pose_fusion [config.toml | -] [motion.csv]`
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_pose_fusion=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next().as_deref() {
        None | Some("-") => TrackerConfig::default(),
        Some(path) => load_config(path)?,
    };
    let replay_path = args.next();

    println!(
        "Tracker: {} sensors, min {} for optical fix, orientation {:?}",
        config.sensors.len(),
        config.fusion.min_sensors,
        config.fusion.orientation_source
    );

    let mut scenario = Scenario::room(config)
        .with_wall_change(WALL_UP_AT_S, Wall::MAX_HEIGHT)
        .with_wall_change(WALL_DOWN_AT_S, Wall::MIN_HEIGHT);

    let report = match replay_path {
        Some(path) => {
            let samples = load_motion_csv(&path)?;
            let Some(first) = samples.first() else {
                bail!("{} contains no samples", path);
            };
            println!("Replaying {} samples from {}", samples.len(), path);
            scenario.replay_with(first.pose, &samples, print_tick)?
        }
        None => {
            let samples = scenario.motion().samples(DT, DURATION_S);
            let start = scenario.motion().pose_at(0.0);
            println!(
                "Simulating {:.1} s at {:.0} Hz, wall up at {:.1} s, down at {:.1} s",
                DURATION_S,
                1.0 / DT,
                WALL_UP_AT_S,
                WALL_DOWN_AT_S
            );
            scenario.replay_with(start, &samples, print_tick)?
        }
    };

    info!("Run finished");
    println!("Done! {}", report);
    if let Some(last) = &report.last {
        println!("Final: {}", last);
    }

    Ok(())
}

fn print_tick(result: &FusionResult) {
    if result.event.is_some() || result.tick % 50 == 0 {
        println!("{}", result);
    }
}
