//! Forwarding of a genuine Switch Pro Controller to the console.
use packed_struct::prelude::*;

use crate::{
    bluetooth::Address,
    config::{
        profile::{ProfileConfig, ProfileStore},
        EmulatorConfig,
    },
    drivers::switch::hid_report::{ButtonStatus, ReportType, INPUT_REPORT_SIZE},
    input::remap::{apply_button_combos, ButtonRemapper},
};

use super::{switch_pro::EmulatorError, ReportSink};

/// Offset of the button bytes in a 0x30 input report
const BUTTONS_OFFSET: usize = 3;
const BUTTONS_SIZE: usize = 3;

/// Forwards reports between the console and a first-party controller. Only
/// the buttons of full input reports are rewritten.
#[derive(Debug)]
pub struct SwitchPassthrough<S: ReportSink> {
    address: Address,
    sink: S,
    remapper: Option<ButtonRemapper>,
}

impl<S: ReportSink> SwitchPassthrough<S> {
    pub fn new(address: Address, sink: S, profiles: &ProfileStore, config: &EmulatorConfig) -> Self {
        log::info!("Forwarding Pro Controller {address}");
        let remapper = if config.enable_button_masks {
            let profile = profiles.get_config(&address).unwrap_or_else(|e| {
                log::warn!("Failed to load profile for {address}, using defaults: {e}");
                ProfileConfig::default()
            });
            Some(ButtonRemapper::from_profile(&profile.misc))
        } else {
            None
        };

        Self {
            address,
            sink,
            remapper,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Forward a report from the controller to the console
    pub fn handle_incoming_report(&mut self, report: &[u8]) -> Result<(), EmulatorError> {
        let is_full_report = report.first() == Some(&ReportType::BasicInputReport.to_primitive())
            && report.len() >= INPUT_REPORT_SIZE;
        if !is_full_report {
            self.sink.write_report(&self.address, report)?;
            return Ok(());
        }

        let mut report = report.to_vec();
        let range = BUTTONS_OFFSET..BUTTONS_OFFSET + BUTTONS_SIZE;
        let mut buttons = ButtonStatus::unpack_from_slice(&report[range.clone()])?;
        apply_button_combos(&mut buttons);
        if let Some(remapper) = self.remapper.as_mut() {
            buttons = remapper.apply(&buttons)?;
        }
        report[range].copy_from_slice(&buttons.pack()?);

        self.sink.write_report(&self.address, &report)?;
        Ok(())
    }

    /// Forward a report from the console to the controller
    pub fn handle_outgoing_report(&mut self, report: &[u8]) -> Result<(), EmulatorError> {
        self.sink.send_report(&self.address, report)?;
        Ok(())
    }
}
