//! Emulated Nintendo Switch Pro Controller.
//!
//! Reports from a physical controller are translated by its [SourceDriver]
//! into full input reports for the console, while reports sent by the
//! console are answered the way a genuine Pro Controller would.
use std::time::Instant;

use packed_struct::{prelude::*, PackingError};
use thiserror::Error;

use crate::{
    bluetooth::Address,
    config::{
        profile::{ProfileConfig, ProfileStore},
        EmulatorConfig,
    },
    drivers::switch::{
        hid_report::{
            BatteryConnection, ImuData, PackedInputDataReport, PackedSubcommandReplyReport,
            ReportError, ReportType, SubcommandResponse,
        },
        rumble::{self, RumbleError},
        spi::{CONTROLLER_COLORS_ADDRESS, SPI_FLASH_SENTINEL},
        subcommand::{
            decode_rumble_command, led_mask_to_player_number, SubcommandId, SubcommandRequest,
            ACK, ACK_DEVICE_INFO, ACK_MCU_CONFIG, ACK_SPI_FLASH_READ, ACK_TRIGGERS_ELAPSED_TIME,
            SPI_READ_MAX_SIZE,
        },
        virtual_flash::{FlashError, VirtualFlash, VirtualFlashStore},
    },
    input::{
        remap::{apply_button_combos, ButtonRemapper},
        source::{SourceDriver, SourceError},
        state::ControllerState,
    },
};

use super::{ReportSink, SinkError};

/// Firmware version reported in the device info reply
const FIRMWARE_VERSION: [u8; 2] = [0x03, 0x48];
/// Controller type reported in the device info reply (Pro Controller)
const DEVICE_TYPE: u8 = 0x03;

/// Canned reply to the MCU configuration subcommand
const MCU_CONFIG_RESPONSE: [u8; 34] = [
    0x01, 0x00, 0xff, 0x00, 0x03, 0x00, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x5c,
];

/// Size of the address and size header echoed in an SPI flash read reply
const SPI_READ_HEADER_SIZE: usize = 5;

/// Possible errors while emulating a controller
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("report sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("source driver error: {0}")]
    Source(#[from] SourceError),
    #[error("failed to pack report: {0}")]
    Packing(#[from] PackingError),
    #[error("invalid report: {0}")]
    Report(#[from] ReportError),
    #[error("invalid rumble command: {0}")]
    Rumble(#[from] RumbleError),
    #[error("virtual flash error: {0}")]
    Flash(#[from] FlashError),
    #[error("no player number for LED mask {0:#06b}")]
    UnknownPlayerLeds(u8),
}

/// Switch Pro Controller emulated on top of an arbitrary physical controller
#[derive(Debug)]
pub struct SwitchProController<S: ReportSink, D: SourceDriver> {
    address: Address,
    sink: S,
    driver: D,
    profile: ProfileConfig,
    flash: VirtualFlash,
    state: ControllerState,
    remapper: Option<ButtonRemapper>,
    epoch: Instant,
}

impl<S: ReportSink, D: SourceDriver> SwitchProController<S, D> {
    /// Attach a new emulated controller for the physical controller with the
    /// given address.
    pub fn new(
        address: Address,
        sink: S,
        mut driver: D,
        profiles: &ProfileStore,
        flash_store: &VirtualFlashStore,
        config: &EmulatorConfig,
    ) -> Result<Self, EmulatorError> {
        log::info!("Attaching emulated Pro Controller for {address}");
        let profile = match profiles.get_config(&address) {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!("Failed to load profile for {address}, using defaults: {e}");
                ProfileConfig::default()
            }
        };
        driver.configure(&profile);

        let calibration = driver.stick_factory_calibration();
        let flash = flash_store.get_or_create(&address, &calibration)?;
        log::debug!("Using virtual flash {:?}", flash.path());

        let remapper = config
            .enable_button_masks
            .then(|| ButtonRemapper::from_profile(&profile.misc));

        Ok(Self {
            address,
            sink,
            driver,
            profile,
            flash,
            state: ControllerState::default(),
            remapper,
            epoch: Instant::now(),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn profile(&self) -> &ProfileConfig {
        &self.profile
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Handle a report from the physical controller, sending the resulting
    /// full input report to the console.
    pub fn handle_incoming_report(&mut self, report: &[u8]) -> Result<(), EmulatorError> {
        self.state = self.driver.update_state(report)?;
        if !self.profile.general.enable_motion {
            self.state.motion = [ImuData::default(); 3];
        }

        let report = self.build_input_report()?;
        log::trace!("Sending input report: {report}");
        let data = report.pack()?;
        self.sink.write_report(&self.address, &data)?;

        Ok(())
    }

    /// Handle a report sent by the console to the controller
    pub fn handle_outgoing_report(&mut self, report: &[u8]) -> Result<(), EmulatorError> {
        let Some(&id) = report.first() else {
            log::debug!("Dropping empty output report");
            return Ok(());
        };
        log::trace!("Received output report {id:#04x}: {report:02x?}");

        match ReportType::from_primitive(id) {
            Some(ReportType::CommandOutputReport) => {
                let request = SubcommandRequest::decode(report)?;
                self.handle_subcommand(&request)
            }
            Some(ReportType::BasicOutputReport) => self.handle_rumble(report),
            _ => {
                log::trace!("Ignoring output report {id:#04x}");
                Ok(())
            }
        }
    }

    /// Detach the emulated controller, flushing its virtual flash
    pub fn disconnect(self) -> Result<(), EmulatorError> {
        log::info!("Detaching emulated Pro Controller for {}", self.address);
        self.flash.close()?;
        Ok(())
    }

    fn handle_subcommand(&mut self, request: &SubcommandRequest) -> Result<(), EmulatorError> {
        let Some(subcommand) = request.subcommand() else {
            log::debug!("Dropping unknown subcommand {:#04x}", request.id);
            return Ok(());
        };
        log::debug!(
            "Handling subcommand {subcommand:?} (packet {}): {:02x?}",
            request.counter,
            request.data
        );

        let id = request.id;
        let response = match subcommand {
            SubcommandId::RequestDeviceInfo => {
                let mut payload = [0; 12];
                payload[..2].copy_from_slice(&FIRMWARE_VERSION);
                payload[2] = DEVICE_TYPE;
                payload[3] = 0x02;
                payload[4..10].copy_from_slice(self.address.as_bytes());
                payload[10] = 0x01;
                payload[11] = 0x02;
                SubcommandResponse::with_data(ACK_DEVICE_INFO, id, &payload)
            }
            SubcommandId::SpiFlashRead => self.spi_flash_read(request)?,
            SubcommandId::SpiFlashWrite | SubcommandId::SpiSectorErase => {
                SubcommandResponse::with_data(ACK, id, &[0x01])
            }
            SubcommandId::SetInputReportMode
            | SubcommandId::SetMcuState
            | SubcommandId::SetHomeLed
            | SubcommandId::EnableImu
            | SubcommandId::EnableVibration => SubcommandResponse::new(ACK, id),
            SubcommandId::TriggersElapsedTime => {
                SubcommandResponse::new(ACK_TRIGGERS_ELAPSED_TIME, id)
            }
            // Not powered off
            SubcommandId::SetShipPowerState => SubcommandResponse::with_data(ACK, id, &[0x00]),
            SubcommandId::SetMcuConfig => {
                SubcommandResponse::with_data(ACK_MCU_CONFIG, id, &MCU_CONFIG_RESPONSE)
            }
            SubcommandId::SetPlayerLeds => {
                let led_mask = request.player_leds_arg()?;
                let player = led_mask_to_player_number(led_mask)
                    .ok_or(EmulatorError::UnknownPlayerLeds(led_mask))?;
                log::debug!("Setting player LEDs to {player:?}");
                self.driver.set_player_led(led_mask, player)?;
                SubcommandResponse::new(ACK, id)
            }
        };

        self.fake_subcommand_response(response)
    }

    /// Reply to an SPI flash read. Only the controller colours are served,
    /// every other address reads as erased flash.
    fn spi_flash_read(
        &self,
        request: &SubcommandRequest,
    ) -> Result<SubcommandResponse, EmulatorError> {
        let (address, size) = request.spi_flash_read_args()?;
        let len = (size as usize).min(SPI_READ_MAX_SIZE);
        log::debug!("Reading {size} bytes of SPI flash at {address:#06x}");

        let mut payload = [0; SPI_READ_HEADER_SIZE + SPI_READ_MAX_SIZE];
        payload[..4].copy_from_slice(&address.to_le_bytes());
        payload[4] = size;
        // The colour quad is always sent whole, whatever size was asked for
        let data_len = if address == CONTROLLER_COLORS_ADDRESS {
            let colours = self.profile.colours.to_bytes();
            payload[SPI_READ_HEADER_SIZE..SPI_READ_HEADER_SIZE + colours.len()]
                .copy_from_slice(&colours);
            len.max(colours.len())
        } else {
            payload[SPI_READ_HEADER_SIZE..SPI_READ_HEADER_SIZE + len].fill(SPI_FLASH_SENTINEL);
            len
        };

        Ok(SubcommandResponse::with_data(
            ACK_SPI_FLASH_READ,
            request.id,
            &payload[..SPI_READ_HEADER_SIZE + data_len],
        ))
    }

    fn handle_rumble(&mut self, report: &[u8]) -> Result<(), EmulatorError> {
        if !self.profile.general.enable_rumble {
            log::trace!("Rumble is disabled for {}", self.address);
            return Ok(());
        }

        let command = decode_rumble_command(report)?;
        let sample = rumble::decode(&command)?;
        log::trace!("Rumble: {sample:?}");
        self.driver.set_vibration(&sample)?;

        Ok(())
    }

    /// Send a subcommand reply to the console. Replies carry the buttons and
    /// sticks as decoded by the driver, without combos or button masks.
    fn fake_subcommand_response(
        &mut self,
        response: SubcommandResponse,
    ) -> Result<(), EmulatorError> {
        let mut reply = PackedSubcommandReplyReport::new(response);
        reply.timer = self.timer();
        reply.info = self.battery_info();
        reply.buttons = self.state.buttons;
        reply.left_stick = self.state.left_stick;
        reply.right_stick = self.state.right_stick;

        let data = reply.pack()?;
        self.sink.write_report(&self.address, &data)?;

        Ok(())
    }

    /// Build a full input report from the current controller state
    fn build_input_report(&mut self) -> Result<PackedInputDataReport, EmulatorError> {
        let mut buttons = self.state.buttons;
        apply_button_combos(&mut buttons);
        if let Some(remapper) = self.remapper.as_mut() {
            buttons = remapper.apply(&buttons)?;
        }

        Ok(PackedInputDataReport {
            timer: self.timer(),
            info: self.battery_info(),
            buttons,
            left_stick: self.state.left_stick,
            right_stick: self.state.right_stick,
            motion: self.state.motion,
            ..Default::default()
        })
    }

    fn battery_info(&self) -> BatteryConnection {
        BatteryConnection {
            battery_level: self.state.battery,
            charging: self.state.charging,
            ..Default::default()
        }
    }

    /// Low 8 bits of the milliseconds elapsed since the controller attached
    fn timer(&self) -> u8 {
        (self.epoch.elapsed().as_millis() & 0xff) as u8
    }
}
