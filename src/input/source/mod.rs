use thiserror::Error;

use crate::{
    config::profile::ProfileConfig,
    drivers::switch::{
        rumble::RumbleSample,
        spi::{StickFactoryCalibration, DEFAULT_STICK_CALIBRATION},
        subcommand::PlayerNumber,
    },
};

use super::state::ControllerState;

/// Possible errors for a vendor source driver
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("unable to decode vendor report: {0}")]
    InvalidReport(String),
    #[error("vendor report too short: expected {expected} bytes, got {actual}")]
    ReportTooShort { expected: usize, actual: usize },
    #[error("device write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A [SourceDriver] translates the raw reports of a physical controller into
/// the canonical [ControllerState] and actuates the controller's rumble
/// motors and player LEDs.
pub trait SourceDriver {
    /// Decode a raw report from the physical controller into a new
    /// controller state.
    fn update_state(&mut self, report: &[u8]) -> Result<ControllerState, SourceError>;

    /// Factory calibration of the left and right analog sticks, written into
    /// newly created flash images.
    fn stick_factory_calibration(&self) -> [StickFactoryCalibration; 2] {
        DEFAULT_STICK_CALIBRATION
    }

    /// Apply the per-device profile (deadzones, stick inversion, LED
    /// brightness) to the driver.
    fn configure(&mut self, _profile: &ProfileConfig) {}

    /// Drive the rumble motors of the controller. Drivers without motors
    /// ignore the request.
    fn set_vibration(&mut self, _sample: &RumbleSample) -> Result<(), SourceError> {
        Ok(())
    }

    /// Set the player indicator of the controller
    fn set_player_led(&mut self, _led_mask: u8, _player: PlayerNumber) -> Result<(), SourceError> {
        Ok(())
    }
}
