pub mod dock;
pub mod sim;

use std::{fs::read_to_string, path::Path};

use crate::error::{DockError, DockResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const SHUTDOWN_TIMEOUT: u64 = 5;

// Default values
const CONFIG_FILE: &str = "config.toml";

/// Top level configuration.
///
/// The four dependency names have no default: a blank name fails [`Config::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub power_sensor: String,
    pub base: String,
    pub camera: String,
    pub detector: String,
    pub dock: dock::Config,
    pub sim: sim::Config,
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::from_path(CONFIG_FILE)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let config_string = read_to_string(path)?;
        Self::from_toml(&config_string)
    }

    pub fn from_toml(config_string: &str) -> Result<Self> {
        Ok(toml::from_str(config_string)?)
    }

    /// Checks dependency names, then the docking parameters.
    pub fn validate(&self) -> DockResult<()> {
        for (name, value) in [
            ("power_sensor", &self.power_sensor),
            ("base", &self.base),
            ("camera", &self.camera),
            ("detector", &self.detector),
        ] {
            if value.trim().is_empty() {
                return Err(DockError::ConfigInvalid(format!("{name} must be defined")));
            }
        }
        self.dock.validate()
    }
}
