//! Tracker configuration: TOML on disk, validated once, read-only afterwards.

mod types;

pub use types::*;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrackerConfig> {
    let path = path.as_ref();
    let config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: TrackerConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(?path, sensors = config.sensors.len(), "Loaded config");
        config
    } else {
        warn!(?path, "No config found, using defaults");
        TrackerConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

/// Write a config as pretty TOML.
pub fn save_config<P: AsRef<Path>>(config: &TrackerConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(?path, "Saved config");
    Ok(())
}
