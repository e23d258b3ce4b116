//! Module for locating per-controller configuration files

use std::path::{Path, PathBuf};

use crate::bluetooth::Address;

/// Base system fallback path to use if one cannot be found with XDG
const FALLBACK_BASE_PATH: &str = "/etc/joybridge";

/// Name of the profile template copied for newly seen controllers
pub const DEFAULT_PROFILE_NAME: &str = "default.ini";
/// Name of the per-controller profile
pub const PROFILE_NAME: &str = "profile.ini";
/// Name of the per-controller virtual SPI flash image
pub const SPI_FLASH_NAME: &str = "spi_flash.bin";

/// Returns the base path for configuration data
pub fn get_base_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix("joybridge") else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_BASE_PATH);
    };

    base_dirs.get_config_home()
}

/// Returns the directory for controller data (e.g. "/etc/joybridge/controllers")
pub fn get_controllers_path(base: &Path) -> PathBuf {
    base.join("controllers")
}

/// Returns the directory for a specific controller
/// (e.g. "/etc/joybridge/controllers/98b6e90a1bff")
pub fn get_controller_path(controllers: &Path, address: &Address) -> PathBuf {
    controllers.join(address.to_hex_string())
}
