//! Decoding of the output reports the console sends to the controller and
//! the subcommands multiplexed inside them.
use packed_struct::prelude::*;

use super::{
    hid_report::{ReportError, ReportType},
    rumble::RUMBLE_COMMAND_SIZE,
};

/// Offset of the left motor rumble command in 0x01 and 0x10 output reports
pub const RUMBLE_OFFSET: usize = 2;
/// Offset of the subcommand id in a 0x01 output report
pub const SUBCOMMAND_ID_OFFSET: usize = 10;
/// Offset of the subcommand arguments in a 0x01 output report
pub const SUBCOMMAND_DATA_OFFSET: usize = SUBCOMMAND_ID_OFFSET + 1;

/// Largest payload the console can receive in a single SPI flash read reply
pub const SPI_READ_MAX_SIZE: usize = 0x1d;

// Response kinds
pub const ACK: u8 = 0x80;
pub const ACK_DEVICE_INFO: u8 = 0x82;
pub const ACK_TRIGGERS_ELAPSED_TIME: u8 = 0x83;
pub const ACK_SPI_FLASH_READ: u8 = 0x90;
pub const ACK_MCU_CONFIG: u8 = 0xa0;

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubcommandId {
    RequestDeviceInfo = 0x02,
    SetInputReportMode = 0x03,
    TriggersElapsedTime = 0x04,
    SetShipPowerState = 0x08,
    SpiFlashRead = 0x10,
    SpiFlashWrite = 0x11,
    SpiSectorErase = 0x12,
    SetMcuConfig = 0x21,
    SetMcuState = 0x22,
    SetPlayerLeds = 0x30,
    SetHomeLed = 0x38,
    EnableImu = 0x40,
    EnableVibration = 0x48,
}

/// Player number shown by the player LEDs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerNumber {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

/// Player numbers indexed by the low nibble of a player LED mask
const LED_PLAYER_MAPPINGS: [Option<PlayerNumber>; 16] = [
    None,                      // 0000
    Some(PlayerNumber::One),   // 0001
    None,                      // 0010
    Some(PlayerNumber::Two),   // 0011
    None,                      // 0100
    Some(PlayerNumber::Six),   // 0101
    Some(PlayerNumber::Eight), // 0110
    Some(PlayerNumber::Three), // 0111
    None,                      // 1000
    Some(PlayerNumber::Five),  // 1001
    Some(PlayerNumber::Six),   // 1010
    Some(PlayerNumber::Seven), // 1011
    None,                      // 1100
    Some(PlayerNumber::Seven), // 1101
    None,                      // 1110
    Some(PlayerNumber::Four),  // 1111
];

/// Returns the player number shown by the given LED mask, if the mask is one
/// the console uses. Only the low nibble (solid LEDs) is considered.
pub fn led_mask_to_player_number(led_mask: u8) -> Option<PlayerNumber> {
    LED_PLAYER_MAPPINGS[(led_mask & 0x0f) as usize]
}

/// A subcommand request carried by a 0x01 output report
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandRequest<'a> {
    /// Packet counter set by the console
    pub counter: u8,
    /// Raw subcommand id. Ids that are not a [SubcommandId] are kept so
    /// they can be logged and dropped by the caller.
    pub id: u8,
    pub data: &'a [u8],
}

impl<'a> SubcommandRequest<'a> {
    /// Decode a subcommand request from a 0x01 output report
    pub fn decode(report: &'a [u8]) -> Result<Self, ReportError> {
        check_report(report, ReportType::CommandOutputReport, SUBCOMMAND_DATA_OFFSET)?;
        Ok(Self {
            counter: report[1],
            id: report[SUBCOMMAND_ID_OFFSET],
            data: &report[SUBCOMMAND_DATA_OFFSET..],
        })
    }

    /// Returns the known subcommand this request is for
    pub fn subcommand(&self) -> Option<SubcommandId> {
        SubcommandId::from_primitive(self.id)
    }

    /// Decode the (address, size) arguments of an SPI flash read
    pub fn spi_flash_read_args(&self) -> Result<(u32, u8), ReportError> {
        let Some(&[a0, a1, a2, a3, size]) = self.data.first_chunk::<5>() else {
            return Err(self.too_short(5));
        };
        Ok((u32::from_le_bytes([a0, a1, a2, a3]), size))
    }

    /// Decode the LED mask argument of a set player LEDs request
    pub fn player_leds_arg(&self) -> Result<u8, ReportError> {
        self.data.first().copied().ok_or_else(|| self.too_short(1))
    }

    fn too_short(&self, args: usize) -> ReportError {
        ReportError::TooShort {
            report: ReportType::CommandOutputReport,
            expected: SUBCOMMAND_DATA_OFFSET + args,
            actual: SUBCOMMAND_DATA_OFFSET + self.data.len(),
        }
    }
}

/// Decode the left motor rumble command carried by a 0x10 output report
pub fn decode_rumble_command(report: &[u8]) -> Result<[u8; RUMBLE_COMMAND_SIZE], ReportError> {
    let end = RUMBLE_OFFSET + RUMBLE_COMMAND_SIZE;
    check_report(report, ReportType::BasicOutputReport, end)?;
    let mut command = [0; RUMBLE_COMMAND_SIZE];
    command.copy_from_slice(&report[RUMBLE_OFFSET..end]);
    Ok(command)
}

/// Validate the report id and minimum length before any field is accessed
fn check_report(report: &[u8], expected: ReportType, min_len: usize) -> Result<(), ReportError> {
    let Some(&id) = report.first() else {
        return Err(ReportError::Empty);
    };
    if id != expected.to_primitive() {
        return Err(ReportError::UnexpectedReportType {
            expected,
            actual: id,
        });
    }
    if report.len() < min_len {
        return Err(ReportError::TooShort {
            report: expected,
            expected: min_len,
            actual: report.len(),
        });
    }
    Ok(())
}
