//! Per-controller customization loaded from `profile.ini`.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::{bluetooth::Address, drivers::switch::spi::ControllerColors};

use super::{
    conversions::{
        parse_bool, parse_brightness, parse_button_mask, parse_deadzone,
        parse_polling_rate_divisor, parse_rgb,
    },
    ini,
    path::{get_controller_path, DEFAULT_PROFILE_NAME, PROFILE_NAME},
    EmulatorConfig,
};

/// Possible errors resolving a controller's [ProfileConfig]
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unable to create controller directory {path:?}: {source}")]
    CreateDirectory { path: PathBuf, source: io::Error },
    #[error("unable to read profile {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneralConfig {
    pub enable_rumble: bool,
    pub enable_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MiscConfig {
    pub use_western_layout: bool,
    /// LED brightness of Sony controllers (0-63)
    pub sony_led_brightness: u32,
    /// Polling rate divisor of DualShock controllers (0-16)
    pub dualshock_pollingrate_divisor: u32,
    pub swap_dpad_lstick: bool,
    pub invert_lstick_xaxis: bool,
    pub invert_lstick_yaxis: bool,
    pub invert_rstick_xaxis: bool,
    pub invert_rstick_yaxis: bool,
    /// Fraction of the left stick range treated as centered, in (0, 1)
    pub lstick_deadzone: f32,
    /// Fraction of the right stick range treated as centered, in (0, 1)
    pub rstick_deadzone: f32,
    pub disable_home_button: bool,
    /// Buttons that latch when pressed (24-bit mask)
    pub hold_enable_mask: u32,
    /// Buttons whose state is inverted (24-bit mask)
    pub inversion_enable_mask: u32,
    /// Buttons that repeat while held (24-bit mask)
    pub turbo_enable_mask: u32,
}

/// Customization applied to a single controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileConfig {
    pub general: GeneralConfig,
    pub colours: ControllerColors,
    pub misc: MiscConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                enable_rumble: true,
                enable_motion: true,
            },
            colours: ControllerColors::default(),
            misc: MiscConfig::default(),
        }
    }
}

impl ProfileConfig {
    /// Parse the given profile content on top of the default profile
    pub fn from_ini(content: &str) -> Self {
        let mut config = Self::default();
        config.apply_ini(content);
        config
    }

    /// Apply the recognised entries of the given profile content. Unknown
    /// keys and malformed values leave the existing values untouched.
    pub fn apply_ini(&mut self, content: &str) {
        ini::parse(content, |section, key, value| self.apply_entry(section, key, value));
    }

    fn apply_entry(&mut self, section: &str, key: &str, value: &str) -> bool {
        let section = section.to_ascii_lowercase();
        let key = key.to_ascii_lowercase();
        match section.as_str() {
            "general" => {
                let general = &mut self.general;
                match key.as_str() {
                    "enable_rumble" => set(&mut general.enable_rumble, parse_bool(value)),
                    "enable_motion" => set(&mut general.enable_motion, parse_bool(value)),
                    _ => log::trace!("Ignoring unknown key `{key}` in [general]"),
                }
            }
            "colours" => {
                let colours = &mut self.colours;
                match key.as_str() {
                    "body" => set(&mut colours.body, parse_rgb(value)),
                    "buttons" => set(&mut colours.buttons, parse_rgb(value)),
                    "left_grip" => set(&mut colours.left_grip, parse_rgb(value)),
                    "right_grip" => set(&mut colours.right_grip, parse_rgb(value)),
                    _ => log::trace!("Ignoring unknown key `{key}` in [colours]"),
                }
            }
            "misc" => {
                let misc = &mut self.misc;
                match key.as_str() {
                    "use_western_layout" => set(&mut misc.use_western_layout, parse_bool(value)),
                    "sony_led_brightness" => {
                        set(&mut misc.sony_led_brightness, parse_brightness(value))
                    }
                    "dualshock_pollingrate_divisor" => set(
                        &mut misc.dualshock_pollingrate_divisor,
                        parse_polling_rate_divisor(value),
                    ),
                    "swap_dpad_lstick" => set(&mut misc.swap_dpad_lstick, parse_bool(value)),
                    "invert_lstick_xaxis" => set(&mut misc.invert_lstick_xaxis, parse_bool(value)),
                    "invert_lstick_yaxis" => set(&mut misc.invert_lstick_yaxis, parse_bool(value)),
                    "invert_rstick_xaxis" => set(&mut misc.invert_rstick_xaxis, parse_bool(value)),
                    "invert_rstick_yaxis" => set(&mut misc.invert_rstick_yaxis, parse_bool(value)),
                    "lstick_deadzone" => set(&mut misc.lstick_deadzone, parse_deadzone(value)),
                    "rstick_deadzone" => set(&mut misc.rstick_deadzone, parse_deadzone(value)),
                    "disable_home_button" => {
                        set(&mut misc.disable_home_button, parse_bool(value))
                    }
                    "hold_enable_mask" => set(&mut misc.hold_enable_mask, parse_button_mask(value)),
                    "inversion_enable_mask" => {
                        set(&mut misc.inversion_enable_mask, parse_button_mask(value))
                    }
                    "turbo_enable_mask" => {
                        set(&mut misc.turbo_enable_mask, parse_button_mask(value))
                    }
                    _ => log::trace!("Ignoring unknown key `{key}` in [misc]"),
                }
            }
            _ => return false,
        }
        true
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Resolves the [ProfileConfig] of each controller from its `profile.ini`,
/// creating it from the shared `default.ini` template on first access.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    controllers_path: PathBuf,
    disabled: bool,
}

impl ProfileStore {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            controllers_path: config.controllers_path(),
            disabled: config.disable_custom_profiles,
        }
    }

    /// Returns the path to the profile of the given controller
    pub fn profile_path(&self, address: &Address) -> PathBuf {
        get_controller_path(&self.controllers_path, address).join(PROFILE_NAME)
    }

    /// Returns the path to the template copied for new controllers
    pub fn template_path(&self) -> PathBuf {
        self.controllers_path.join(DEFAULT_PROFILE_NAME)
    }

    /// Returns the profile of the given controller. If custom profiles are
    /// disabled, the built-in default is always returned.
    pub fn get_config(&self, address: &Address) -> Result<ProfileConfig, ProfileError> {
        if self.disabled {
            log::debug!("Custom profiles are disabled. Using default profile for {address}");
            return Ok(ProfileConfig::default());
        }

        let path = self.profile_path(address);
        if !path.exists() {
            let created = self.create_from_template(&path)?;
            if !created {
                return Ok(ProfileConfig::default());
            }
        }

        log::debug!("Loading profile for {address} from {path:?}");
        let content = fs::read_to_string(&path).map_err(|source| ProfileError::Read {
            path: path.clone(),
            source,
        })?;

        Ok(ProfileConfig::from_ini(content.as_str()))
    }

    /// Copy the default template to the given profile path. Returns false if
    /// there is no template to copy.
    fn create_from_template(&self, path: &Path) -> Result<bool, ProfileError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ProfileError::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let template = self.template_path();
        match fs::copy(&template, path) {
            Ok(_) => {
                log::info!("Created profile {path:?} from {template:?}");
                Ok(true)
            }
            Err(e) => {
                log::warn!("Unable to copy profile template {template:?}: {e}");
                Ok(false)
            }
        }
    }
}
