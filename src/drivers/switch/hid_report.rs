//! Wire layout of the Nintendo Switch Pro Controller HID reports.
//!
//! Sources:
//! - https://github.com/dekuNukem/Nintendo_Switch_Reverse_Engineering/blob/master/bluetooth_hid_notes.md
//! - https://github.com/torvalds/linux/blob/master/drivers/hid/hid-nintendo.c
//! - https://switchbrew.org/w/index.php?title=Joy-Con
use packed_struct::prelude::*;
use thiserror::Error;

/// Size of a full (0x30) input report including the report id
pub const INPUT_REPORT_SIZE: usize = 49;
/// Size of a subcommand reply (0x21) input report including the report id
pub const SUBCOMMAND_REPLY_REPORT_SIZE: usize = 50;
/// Size of the subcommand response embedded in a 0x21 report
pub const SUBCOMMAND_RESPONSE_SIZE: usize = 37;
/// Size of the data section of a subcommand response
pub const SUBCOMMAND_RESPONSE_DATA_SIZE: usize = SUBCOMMAND_RESPONSE_SIZE - 2;

/// Centered value of a 12-bit analog stick axis
pub const STICK_ZERO: u16 = 0x800;
/// Maximum value of a 12-bit analog stick axis
pub const STICK_MAX: u16 = 0xfff;

/// Mask of the 24 bits of a packed button word that carry button state
pub const BUTTON_WORD_MASK: u32 = 0x00ff_ffff;

/// Errors that can occur when decoding a report sent by the console
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("report is empty")]
    Empty,
    #[error("unknown report type `{0:#04x}`")]
    UnknownReportType(u8),
    #[error("unexpected report type: expected `{expected:?}`, got `{actual:#04x}`")]
    UnexpectedReportType { expected: ReportType, actual: u8 },
    #[error("report `{report:?}` is too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        report: ReportType,
        expected: usize,
        actual: usize,
    },
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug)]
pub enum ReportType {
    CommandOutputReport = 0x01,
    McuUpdateOutputReport = 0x03,
    BasicOutputReport = 0x10,
    McuOutputReport = 0x11,
    AttachmentOutputReport = 0x12,
    CommandInputReport = 0x21,
    McuUpdateInputReport = 0x23,
    BasicInputReport = 0x30,
    McuInputReport = 0x31,
    AttachmentInputReport = 0x32,
    GenericInputReport = 0x3F,
    ExtGripOutputReport = 0x80,
    ExtGripInputReport = 0x81,
}

impl TryFrom<u8> for ReportType {
    type Error = ReportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ReportType::from_primitive(value).ok_or(ReportError::UnknownReportType(value))
    }
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug, Default)]
pub enum BatteryLevel {
    Empty = 0,
    Critical = 1,
    Low = 2,
    Medium = 3,
    #[default]
    Full = 4,
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "1")]
pub struct BatteryConnection {
    /// Battery level. 8=full, 6=medium, 4=low, 2=critical, 0=empty. LSB=Charging.
    #[packed_field(bits = "0..=2", ty = "enum")]
    pub battery_level: BatteryLevel,
    #[packed_field(bits = "3")]
    pub charging: bool,
    /// Connection info. (con_info >> 1) & 3 - 3=JC, 0=Pro/ChrGrip. con_info & 1 - 1=Switch/USB powered.
    #[packed_field(bits = "4..=7")]
    pub conn_info: Integer<u8, packed_bits::Bits<4>>,
}

#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct ButtonStatus {
    // byte 0 (Right)
    #[packed_field(bits = "7")]
    pub y: bool,
    #[packed_field(bits = "6")]
    pub x: bool,
    #[packed_field(bits = "5")]
    pub b: bool,
    #[packed_field(bits = "4")]
    pub a: bool,
    #[packed_field(bits = "3")]
    pub sr_right: bool,
    #[packed_field(bits = "2")]
    pub sl_right: bool,
    #[packed_field(bits = "1")]
    pub r: bool,
    #[packed_field(bits = "0")]
    pub zr: bool,

    // byte 1 (Shared)
    #[packed_field(bits = "15")]
    pub minus: bool,
    #[packed_field(bits = "14")]
    pub plus: bool,
    #[packed_field(bits = "13")]
    pub r_stick: bool,
    #[packed_field(bits = "12")]
    pub l_stick: bool,
    #[packed_field(bits = "11")]
    pub home: bool,
    #[packed_field(bits = "10")]
    pub capture: bool,
    #[packed_field(bits = "9")]
    pub _unused: bool,
    #[packed_field(bits = "8")]
    pub charging_grip: bool,

    // byte 2 (Left)
    #[packed_field(bits = "23")]
    pub down: bool,
    #[packed_field(bits = "22")]
    pub up: bool,
    #[packed_field(bits = "21")]
    pub right: bool,
    #[packed_field(bits = "20")]
    pub left: bool,
    #[packed_field(bits = "19")]
    pub sr_left: bool,
    #[packed_field(bits = "18")]
    pub sl_left: bool,
    #[packed_field(bits = "17")]
    pub l: bool,
    #[packed_field(bits = "16")]
    pub zl: bool,
}

impl ButtonStatus {
    /// Returns the buttons as a little-endian 24-bit word, where the first
    /// report byte occupies the lowest 8 bits.
    pub fn to_word(&self) -> Result<u32, PackingError> {
        let [right, shared, left] = self.pack()?;
        Ok(u32::from_le_bytes([right, shared, left, 0]))
    }

    /// Builds the button state from the low 24 bits of the given word
    pub fn from_word(word: u32) -> Result<Self, PackingError> {
        let [right, shared, left, _] = word.to_le_bytes();
        Self::unpack(&[right, shared, left])
    }
}

/// Analog stick sample made of two 12-bit axes packed into three bytes.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct StickData {
    #[packed_field(bytes = "0..=2")]
    pub data: [u8; 3],
}

impl Default for StickData {
    fn default() -> Self {
        Self::new(STICK_ZERO, STICK_ZERO)
    }
}

impl StickData {
    pub fn new(x: u16, y: u16) -> Self {
        let mut stick = Self { data: [0; 3] };
        stick.set(x, y);
        stick
    }

    pub fn get_x(&self) -> u16 {
        self.data[0] as u16 | ((self.data[1] as u16 & 0x0f) << 8)
    }

    pub fn get_y(&self) -> u16 {
        ((self.data[1] as u16) >> 4) | ((self.data[2] as u16) << 4)
    }

    /// Set both axes. Values are truncated to 12 bits.
    pub fn set(&mut self, x: u16, y: u16) {
        let x = x & STICK_MAX;
        let y = y & STICK_MAX;
        self.data = [
            (x & 0xff) as u8,
            ((x >> 8) as u8) | (((y & 0x0f) as u8) << 4),
            (y >> 4) as u8,
        ];
    }
}

/// The 6-Axis data is repeated 3 times. On Joy-con with a 15ms packet push,
/// this is translated to 5ms difference sampling. E.g. 1st sample 0ms, 2nd 5ms,
/// 3rd 10ms. Using all 3 samples let you have a 5ms precision instead of 15ms.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq, Default)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct ImuData {
    #[packed_field(bytes = "0..=1", endian = "lsb")]
    pub accel_x: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub accel_y: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub accel_z: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub gyro_x: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub gyro_y: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub gyro_z: Integer<i16, packed_bits::Bits<16>>,
}

/// Full input report (0x30) streamed to the console on every state update.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "49")]
pub struct PackedInputDataReport {
    // byte 0-2
    /// Input report ID
    #[packed_field(bytes = "0", ty = "enum")]
    pub id: ReportType,
    /// Timer. Increments very fast. Can be used to estimate excess Bluetooth latency.
    #[packed_field(bytes = "1")]
    pub timer: u8,
    /// Battery and connection information
    #[packed_field(bytes = "2")]
    pub info: BatteryConnection,

    // byte 3-5
    /// Button status
    #[packed_field(bytes = "3..=5")]
    pub buttons: ButtonStatus,

    // byte 6-11
    /// Left analog stick
    #[packed_field(bytes = "6..=8")]
    pub left_stick: StickData,
    /// Right analog stick
    #[packed_field(bytes = "9..=11")]
    pub right_stick: StickData,

    // byte 12
    /// Vibrator input report. Decides if next vibration pattern should be sent.
    #[packed_field(bytes = "12")]
    pub vibrator_report: u8,

    // byte 13-48
    #[packed_field(bytes = "13..=48", element_size_bytes = "12")]
    pub motion: [ImuData; 3],
}

impl Default for PackedInputDataReport {
    fn default() -> Self {
        Self {
            id: ReportType::BasicInputReport,
            timer: 0,
            info: BatteryConnection::default(),
            buttons: ButtonStatus::default(),
            left_stick: StickData::default(),
            right_stick: StickData::default(),
            vibrator_report: 0,
            motion: [ImuData::default(); 3],
        }
    }
}

/// Response to a subcommand, embedded in a 0x21 report. The ack byte encodes
/// the kind of response rather than plain success.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "37")]
pub struct SubcommandResponse {
    #[packed_field(bytes = "0")]
    pub ack: u8,
    /// Subcommand id this is a reply to
    #[packed_field(bytes = "1")]
    pub id: u8,
    #[packed_field(bytes = "2..=36")]
    pub data: [u8; 35],
}

impl SubcommandResponse {
    pub fn new(ack: u8, id: u8) -> Self {
        Self {
            ack,
            id,
            data: [0; SUBCOMMAND_RESPONSE_DATA_SIZE],
        }
    }

    /// Create a response with the given payload copied into the start of the
    /// data section. Payloads longer than the data section are truncated.
    pub fn with_data(ack: u8, id: u8, payload: &[u8]) -> Self {
        let mut response = Self::new(ack, id);
        let len = payload.len().min(SUBCOMMAND_RESPONSE_DATA_SIZE);
        response.data[..len].copy_from_slice(&payload[..len]);
        response
    }
}

/// Subcommand reply report (0x21). Carries the current input snapshot along
/// with a subcommand response.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "50")]
pub struct PackedSubcommandReplyReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub id: ReportType,
    #[packed_field(bytes = "1")]
    pub timer: u8,
    #[packed_field(bytes = "2")]
    pub info: BatteryConnection,
    #[packed_field(bytes = "3..=5")]
    pub buttons: ButtonStatus,
    #[packed_field(bytes = "6..=8")]
    pub left_stick: StickData,
    #[packed_field(bytes = "9..=11")]
    pub right_stick: StickData,
    #[packed_field(bytes = "12")]
    pub vibrator_report: u8,
    #[packed_field(bytes = "13..=49")]
    pub response: SubcommandResponse,
}

impl PackedSubcommandReplyReport {
    pub fn new(response: SubcommandResponse) -> Self {
        Self {
            id: ReportType::CommandInputReport,
            timer: 0,
            info: BatteryConnection::default(),
            buttons: ButtonStatus::default(),
            left_stick: StickData::default(),
            right_stick: StickData::default(),
            vibrator_report: 0,
            response,
        }
    }
}
