pub mod conversions;
pub mod ini;
pub mod path;
pub mod profile;


use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents all possible errors loading an [EmulatorConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Process-wide emulator settings. An [EmulatorConfig] is passed explicitly
/// to the profile and flash stores and to every emulated controller.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct EmulatorConfig {
    /// Ignore per-controller profiles and always use the built-in defaults
    pub disable_custom_profiles: bool,
    /// Apply the hold, turbo and inversion button masks from the controller
    /// profile to every input report
    pub enable_button_masks: bool,
    /// Directory containing the `controllers` directory. Defaults to the XDG
    /// config directory.
    pub base_path: Option<PathBuf>,
}

impl EmulatorConfig {
    /// Load an [EmulatorConfig] from the given YAML string
    pub fn from_yaml(content: &str) -> Result<EmulatorConfig, LoadError> {
        let config: EmulatorConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load an [EmulatorConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<EmulatorConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: EmulatorConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Returns the directory holding per-controller profiles and flash images
    /// (e.g. "~/.config/joybridge/controllers")
    pub fn controllers_path(&self) -> PathBuf {
        let base = match self.base_path.as_ref() {
            Some(base) => base.clone(),
            None => path::get_base_path(),
        };
        path::get_controllers_path(&base)
    }
}
