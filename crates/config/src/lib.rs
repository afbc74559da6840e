//! Configuration models and loaders for the descent simulator.

pub mod scenario;

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use scenario::{
    AerodynamicsConfig, ControllerConfig, DragConfig, EnvironmentConfig, GainsConfig,
    GeneticSettings, GradientSettings, InitialStateConfig, IntegratorConfig, IntegratorMethod,
    LanderConfig, OptimizerConfig, PlanConfig, ScenarioConfig, TerrainConfig, TolerancesConfig,
    WindConfig,
};

/// Point-mass body parsed from a catalog file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BodyConfig {
    pub name: String,
    pub mass_kg: f64,
    /// Heliocentric position (m).
    pub position_m: [f64; 3],
    pub velocity_m_s: [f64; 3],
    /// Pinned bodies keep their initial position and velocity.
    #[serde(default)]
    pub fixed: bool,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load a single scenario from a YAML or TOML file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let path = path.as_ref();
    if path.is_dir() {
        return Err(ConfigError::Invalid(format!(
            "{} is a directory, expected a scenario file",
            path.display()
        )));
    }
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load a body catalog from a YAML list, a single TOML record, or a directory of TOML
/// records (read in file-name order).
pub fn load_bodies<P: AsRef<Path>>(path: P) -> Result<Vec<BodyConfig>, ConfigError> {
    let bodies: Vec<BodyConfig> = load_records(path)?;
    if bodies.is_empty() {
        return Err(ConfigError::Invalid("body catalog is empty".to_string()));
    }
    let mut seen = BTreeSet::new();
    for body in &bodies {
        if !seen.insert(body.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate body name `{}`",
                body.name
            )));
        }
        if !(body.mass_kg.is_finite() && body.mass_kg > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "body `{}` has invalid mass {}",
                body.name, body.mass_kg
            )));
        }
    }
    Ok(bodies)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
