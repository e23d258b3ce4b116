use std::{collections::VecDeque, error::Error, fs};

use packed_struct::prelude::*;

use crate::{
    bluetooth::Address,
    config::{
        profile::{ProfileConfig, ProfileStore},
        EmulatorConfig,
    },
    drivers::switch::{
        hid_report::{
            BatteryLevel, ButtonStatus, ImuData, StickData, INPUT_REPORT_SIZE,
            SUBCOMMAND_REPLY_REPORT_SIZE,
        },
        rumble::RumbleSample,
        spi::{PRO_CONTROLLER_COLORS, SPI_FLASH_SIZE},
        subcommand::PlayerNumber,
        virtual_flash::VirtualFlashStore,
    },
    input::{
        source::{SourceDriver, SourceError},
        state::ControllerState,
    },
};

use super::{
    switch_pro::{EmulatorError, SwitchProController},
    ReportSink, SinkError,
};

const ADDRESS: Address = Address([0x98, 0xb6, 0xe9, 0x01, 0x02, 0x03]);

/// Offset of the subcommand response in a 0x21 reply
const RESPONSE: usize = 13;

#[derive(Debug, Default)]
struct RecordingSink {
    written: Vec<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    fail: bool,
}

impl ReportSink for RecordingSink {
    fn write_report(&mut self, address: &Address, report: &[u8]) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Disconnected(*address));
        }
        self.written.push(report.to_vec());
        Ok(())
    }

    fn send_report(&mut self, _address: &Address, report: &[u8]) -> Result<(), SinkError> {
        self.sent.push(report.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ScriptedDriver {
    states: VecDeque<ControllerState>,
    vibrations: Vec<RumbleSample>,
    leds: Vec<(u8, PlayerNumber)>,
    configured: bool,
}

impl ScriptedDriver {
    fn with_states(states: impl IntoIterator<Item = ControllerState>) -> Self {
        Self {
            states: states.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl SourceDriver for ScriptedDriver {
    fn update_state(&mut self, _report: &[u8]) -> Result<ControllerState, SourceError> {
        self.states
            .pop_front()
            .ok_or_else(|| SourceError::InvalidReport("no scripted state".to_string()))
    }

    fn configure(&mut self, _profile: &ProfileConfig) {
        self.configured = true;
    }

    fn set_vibration(&mut self, sample: &RumbleSample) -> Result<(), SourceError> {
        self.vibrations.push(*sample);
        Ok(())
    }

    fn set_player_led(&mut self, led_mask: u8, player: PlayerNumber) -> Result<(), SourceError> {
        self.leds.push((led_mask, player));
        Ok(())
    }
}

type Controller = SwitchProController<RecordingSink, ScriptedDriver>;

fn attach(
    dir: &tempfile::TempDir,
    config: EmulatorConfig,
    driver: ScriptedDriver,
) -> Result<Controller, EmulatorError> {
    let config = EmulatorConfig {
        base_path: Some(dir.path().to_path_buf()),
        ..config
    };
    let profiles = ProfileStore::new(&config);
    let flash = VirtualFlashStore::new(&config);
    SwitchProController::new(
        ADDRESS,
        RecordingSink::default(),
        driver,
        &profiles,
        &flash,
        &config,
    )
}

/// Write the shared profile template used for new controllers
fn write_template(dir: &tempfile::TempDir, content: &str) -> Result<(), Box<dyn Error>> {
    let controllers = dir.path().join("controllers");
    fs::create_dir_all(&controllers)?;
    fs::write(controllers.join("default.ini"), content)?;
    Ok(())
}

fn subcommand(id: u8, args: &[u8]) -> Vec<u8> {
    let mut report = vec![0x01, 0x05, 0x00, 0x01, 0x40, 0x40, 0x00, 0x01, 0x40, 0x40, id];
    report.extend_from_slice(args);
    report
}

fn last_written(controller: &Controller) -> &[u8] {
    controller
        .sink()
        .written
        .last()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[test]
fn test_attach() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    assert!(controller.driver().configured);
    assert_eq!(controller.state(), &ControllerState::default());
    assert_eq!(controller.state().left_stick.get_x(), 0x800);
    assert!(controller.sink().written.is_empty());

    let image = dir.path().join("controllers/98b6e9010203/spi_flash.bin");
    assert_eq!(fs::metadata(image)?.len(), SPI_FLASH_SIZE as u64);

    controller.disconnect()?;
    Ok(())
}

#[test]
fn test_input_report() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let state = ControllerState {
        buttons: ButtonStatus {
            a: true,
            minus: true,
            down: true,
            ..Default::default()
        },
        left_stick: StickData::new(0x123, 0x456),
        battery: BatteryLevel::Medium,
        charging: true,
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([state]),
    )?;

    controller.handle_incoming_report(&[0xaa; 16])?;
    let report = last_written(&controller);
    assert_eq!(report.len(), INPUT_REPORT_SIZE);
    assert_eq!(report[0], 0x30);
    // Medium battery, charging, no connection info
    assert_eq!(report[2], 0x70);
    // A, then HOME synthesized from MINUS + DOWN
    assert_eq!(&report[3..6], &[0x08, 0x10, 0x00]);
    assert_eq!(&report[6..9], &[0x23, 0x61, 0x45]);
    assert_eq!(&report[9..12], &[0x00, 0x08, 0x80]);

    // The canonical state is kept as decoded
    assert!(controller.state().buttons.minus);

    Ok(())
}

#[test]
fn test_driver_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    let result = controller.handle_incoming_report(&[0x00]);
    assert!(matches!(result, Err(EmulatorError::Source(_))));
    assert!(controller.sink().written.is_empty());

    Ok(())
}

#[test]
fn test_motion_disabled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[general]\nenable_motion = false\n")?;
    let imu = ImuData {
        accel_x: Integer::from_primitive(100),
        gyro_z: Integer::from_primitive(-100),
        ..Default::default()
    };
    let state = ControllerState {
        motion: [imu; 3],
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([state, state]),
    )?;
    assert!(!controller.profile().general.enable_motion);

    controller.handle_incoming_report(&[0x00])?;
    let report = last_written(&controller);
    assert!(report[13..].iter().all(|b| *b == 0));

    Ok(())
}

#[test]
fn test_motion_enabled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let imu = ImuData {
        accel_x: Integer::from_primitive(0x0102),
        ..Default::default()
    };
    let state = ControllerState {
        motion: [imu; 3],
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([state]),
    )?;

    controller.handle_incoming_report(&[0x00])?;
    let report = last_written(&controller);
    assert_eq!(&report[13..15], &[0x02, 0x01]);
    assert_eq!(&report[25..27], &[0x02, 0x01]);
    assert_eq!(&report[37..39], &[0x02, 0x01]);

    Ok(())
}

#[test]
fn test_button_masks() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[misc]\ninversion_enable_mask = 1\n")?;
    let config = EmulatorConfig {
        enable_button_masks: true,
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        config,
        ScriptedDriver::with_states([ControllerState::default()]),
    )?;

    controller.handle_incoming_report(&[0x00])?;
    assert_eq!(&last_written(&controller)[3..6], &[0x01, 0x00, 0x00]);

    Ok(())
}

#[test]
fn test_button_masks_disabled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[misc]\ninversion_enable_mask = 1\n")?;
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([ControllerState::default()]),
    )?;

    controller.handle_incoming_report(&[0x00])?;
    assert_eq!(&last_written(&controller)[3..6], &[0x00, 0x00, 0x00]);

    Ok(())
}

#[test]
fn test_device_info() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x02, &[]))?;
    let reply = last_written(&controller);
    assert_eq!(reply.len(), SUBCOMMAND_REPLY_REPORT_SIZE);
    assert_eq!(reply[0], 0x21);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0x82, 0x02]);
    assert_eq!(
        &reply[RESPONSE + 2..RESPONSE + 14],
        &[0x03, 0x48, 0x03, 0x02, 0x98, 0xb6, 0xe9, 0x01, 0x02, 0x03, 0x01, 0x02]
    );

    Ok(())
}

#[test]
fn test_reply_carries_input_state() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let state = ControllerState {
        buttons: ButtonStatus {
            b: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([state]),
    )?;

    controller.handle_incoming_report(&[0x00])?;
    controller.handle_outgoing_report(&subcommand(0x48, &[0x01]))?;
    let reply = last_written(&controller);
    assert_eq!(reply[2], 0x80);
    assert_eq!(&reply[3..6], &[0x04, 0x00, 0x00]);
    assert_eq!(&reply[6..9], &[0x00, 0x08, 0x80]);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0x80, 0x48]);

    Ok(())
}

#[test]
fn test_spi_flash_read_colours() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[colours]\nbody = #ff8800\nbuttons = rgb(1, 2, 3)\n")?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x10, &[0x50, 0x60, 0x00, 0x00, 0x0d]))?;
    let reply = last_written(&controller);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0x90, 0x10]);
    // Echoed address and size
    assert_eq!(
        &reply[RESPONSE + 2..RESPONSE + 7],
        &[0x50, 0x60, 0x00, 0x00, 0x0d]
    );
    let colours = &reply[RESPONSE + 7..RESPONSE + 19];
    assert_eq!(&colours[..6], &[0xff, 0x88, 0x00, 0x01, 0x02, 0x03]);
    assert_eq!(
        &colours[6..],
        &PRO_CONTROLLER_COLORS.to_bytes()[6..],
        "grips keep their default colour"
    );
    assert_eq!(reply[RESPONSE + 19], 0x00);

    Ok(())
}

#[test]
fn test_reply_carries_decoded_buttons() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let state = ControllerState {
        buttons: ButtonStatus {
            minus: true,
            down: true,
            ..Default::default()
        },
        right_stick: StickData::new(0x123, 0x456),
        ..Default::default()
    };
    let mut controller = attach(
        &dir,
        EmulatorConfig::default(),
        ScriptedDriver::with_states([state]),
    )?;

    controller.handle_incoming_report(&[0x00])?;
    assert_eq!(&last_written(&controller)[3..6], &[0x00, 0x10, 0x00]);

    // Replies report MINUS + DOWN as pressed instead of the synthesized HOME
    controller.handle_outgoing_report(&subcommand(0x03, &[0x30]))?;
    let reply = last_written(&controller);
    assert_eq!(&reply[3..6], &[0x00, 0x01, 0x01]);
    assert_eq!(&reply[9..12], &[0x23, 0x61, 0x45]);

    Ok(())
}

#[test]
fn test_spi_flash_read_colours_short_size() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x10, &[0x50, 0x60, 0x00, 0x00, 0x03]))?;
    let reply = last_written(&controller);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0x90, 0x10]);
    // The requested size is echoed but the whole colour quad is sent
    assert_eq!(reply[RESPONSE + 6], 0x03);
    assert_eq!(
        &reply[RESPONSE + 7..RESPONSE + 19],
        &PRO_CONTROLLER_COLORS.to_bytes()
    );
    assert!(reply[RESPONSE + 19..].iter().all(|b| *b == 0));

    Ok(())
}

#[test]
fn test_spi_flash_read_unmapped() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x10, &[0x3d, 0x60, 0x00, 0x00, 0x12]))?;
    let reply = last_written(&controller);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0x90, 0x10]);
    let data = &reply[RESPONSE + 7..];
    assert!(data[..0x12].iter().all(|b| *b == 0xff));
    assert!(data[0x12..].iter().all(|b| *b == 0x00));

    // Truncated arguments are rejected
    let result = controller.handle_outgoing_report(&subcommand(0x10, &[0x3d, 0x60]));
    assert!(matches!(result, Err(EmulatorError::Report(_))));

    Ok(())
}

#[test]
fn test_spi_flash_write_and_erase() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;
    let image = dir.path().join("controllers/98b6e9010203/spi_flash.bin");
    let before = fs::read(&image)?;

    controller.handle_outgoing_report(&subcommand(
        0x11,
        &[0x50, 0x60, 0x00, 0x00, 0x01, 0x00],
    ))?;
    assert_eq!(
        &last_written(&controller)[RESPONSE..RESPONSE + 3],
        &[0x80, 0x11, 0x01]
    );

    controller.handle_outgoing_report(&subcommand(0x12, &[0x00, 0x60, 0x00, 0x00]))?;
    assert_eq!(
        &last_written(&controller)[RESPONSE..RESPONSE + 3],
        &[0x80, 0x12, 0x01]
    );

    controller.disconnect()?;
    assert_eq!(fs::read(&image)?, before);

    Ok(())
}

#[test]
fn test_simple_acks() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    for (id, ack) in [
        (0x03, 0x80),
        (0x22, 0x80),
        (0x38, 0x80),
        (0x40, 0x80),
        (0x48, 0x80),
        (0x04, 0x83),
        (0x08, 0x80),
    ] {
        controller.handle_outgoing_report(&subcommand(id, &[0x01]))?;
        let reply = last_written(&controller);
        assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[ack, id], "subcommand {id:#04x}");
        assert!(reply[RESPONSE + 2..].iter().all(|b| *b == 0));
    }
    assert_eq!(controller.sink().written.len(), 7);

    Ok(())
}

#[test]
fn test_mcu_config() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x21, &[0x21, 0x00, 0x00]))?;
    let reply = last_written(&controller);
    assert_eq!(&reply[RESPONSE..RESPONSE + 2], &[0xa0, 0x21]);
    assert_eq!(
        &reply[RESPONSE + 2..RESPONSE + 10],
        &[0x01, 0x00, 0xff, 0x00, 0x03, 0x00, 0x05, 0x01]
    );
    assert_eq!(&reply[RESPONSE + 34..RESPONSE + 36], &[0x00, 0x5c]);

    Ok(())
}

#[test]
fn test_player_leds() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&subcommand(0x30, &[0x0f]))?;
    assert_eq!(controller.driver().leds, vec![(0x0f, PlayerNumber::Four)]);
    assert_eq!(
        &last_written(&controller)[RESPONSE..RESPONSE + 2],
        &[0x80, 0x30]
    );

    let result = controller.handle_outgoing_report(&subcommand(0x30, &[0x00]));
    assert!(matches!(result, Err(EmulatorError::UnknownPlayerLeds(0x00))));
    assert_eq!(controller.driver().leds.len(), 1);
    assert_eq!(controller.sink().written.len(), 1);

    Ok(())
}

#[test]
fn test_ignored_reports() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    // Unknown subcommand
    controller.handle_outgoing_report(&subcommand(0x99, &[]))?;
    // Unknown and unhandled report ids
    controller.handle_outgoing_report(&[0x55, 0x00])?;
    controller.handle_outgoing_report(&[0x11, 0x00, 0x00])?;
    controller.handle_outgoing_report(&[])?;

    assert!(controller.sink().written.is_empty());
    assert!(controller.driver().vibrations.is_empty());

    Ok(())
}

#[test]
fn test_rumble() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&[0x10, 0x01, 0x00, 0x01, 0x40, 0x40])?;
    let vibrations = &controller.driver().vibrations;
    assert_eq!(vibrations.len(), 1);
    assert_eq!(vibrations[0].high_band_freq, 320.0);
    assert_eq!(vibrations[0].low_band_freq, 160.0);
    assert!(vibrations[0].is_silent());
    assert!(controller.sink().written.is_empty(), "rumble is not acknowledged");

    let result = controller.handle_outgoing_report(&[0x10, 0x01, 0x00, 0x01, 0xc0, 0x72]);
    assert!(matches!(result, Err(EmulatorError::Rumble(_))));

    let result = controller.handle_outgoing_report(&[0x10, 0x01, 0x00]);
    assert!(matches!(result, Err(EmulatorError::Report(_))));

    Ok(())
}

#[test]
fn test_rumble_disabled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[general]\nenable_rumble = false\n")?;
    let mut controller = attach(&dir, EmulatorConfig::default(), ScriptedDriver::default())?;

    controller.handle_outgoing_report(&[0x10, 0x01, 0x00, 0x01, 0x40, 0x40])?;
    // Malformed commands are not even decoded
    controller.handle_outgoing_report(&[0x10])?;
    assert!(controller.driver().vibrations.is_empty());

    Ok(())
}

#[test]
fn test_custom_profiles_disabled() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_template(&dir, "[general]\nenable_rumble = false\n")?;
    let config = EmulatorConfig {
        disable_custom_profiles: true,
        ..Default::default()
    };
    let controller = attach(&dir, config, ScriptedDriver::default())?;

    assert!(controller.profile().general.enable_rumble);
    assert!(!dir
        .path()
        .join("controllers/98b6e9010203/profile.ini")
        .exists());

    Ok(())
}

#[test]
fn test_sink_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = EmulatorConfig {
        base_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let sink = RecordingSink {
        fail: true,
        ..Default::default()
    };
    let mut controller = SwitchProController::new(
        ADDRESS,
        sink,
        ScriptedDriver::default(),
        &ProfileStore::new(&config),
        &VirtualFlashStore::new(&config),
        &config,
    )?;

    let result = controller.handle_outgoing_report(&subcommand(0x02, &[]));
    assert!(matches!(
        result,
        Err(EmulatorError::Sink(SinkError::Disconnected(ADDRESS)))
    ));

    Ok(())
}
