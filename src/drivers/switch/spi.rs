//! Data stored in the controller's SPI flash that the console reads back.
//!
//! Layout as read from an official Pro Controller:
//! @ 0x6000: ff ff ff ff ff ff ff ff ff ff ff ff ff ff ff ff                   <= Serial
//! @ 0x603d: e6 a5 67 1a 58 78 50 56 60 1a f8 7f 20 c6 63 d5 15 5e ff 32 32 32 <= Stick factory calibration
//! @ 0x6050: 32 32 32 ff ff ff ff ff ff ff ff ff                               <= RGB colours
//! @ 0x8010: ff ff ff ...                                                      <= User stick calibration
use serde::Serialize;

/// Size of the emulated SPI flash (the first 64KB of the real chip)
pub const SPI_FLASH_SIZE: usize = 0x10000;
/// Value of erased/unwritten flash
pub const SPI_FLASH_SENTINEL: u8 = 0xff;
/// Address of the left and right stick factory calibration records
pub const STICK_FACTORY_CALIBRATION_ADDRESS: u32 = 0x603d;
/// Address of the body, buttons, left grip and right grip colours
pub const CONTROLLER_COLORS_ADDRESS: u32 = 0x6050;

/// Factory calibration for a single analog stick: three pairs of 12-bit
/// values (maximum above center, center, minimum below center).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StickFactoryCalibration {
    pub data: [u8; 9],
}

impl StickFactoryCalibration {
    /// Pack the given (x, y) pairs into a calibration record
    pub fn new(max: (u16, u16), center: (u16, u16), min: (u16, u16)) -> Self {
        let mut data = [0; 9];
        for (chunk, (x, y)) in data.chunks_exact_mut(3).zip([max, center, min]) {
            chunk[0] = (x & 0xff) as u8;
            chunk[1] = ((x >> 8) & 0x0f) as u8 | (((y & 0x0f) as u8) << 4);
            chunk[2] = ((y >> 4) & 0xff) as u8;
        }
        Self { data }
    }

    /// Returns the packed value pair at the given index (0=max, 1=center, 2=min)
    pub fn pair(&self, index: usize) -> Option<(u16, u16)> {
        let chunk = self.data.chunks_exact(3).nth(index)?;
        let x = chunk[0] as u16 | ((chunk[1] as u16 & 0x0f) << 8);
        let y = (chunk[1] as u16 >> 4) | ((chunk[2] as u16) << 4);
        Some((x, y))
    }
}

/// Factory calibration records of the left and right sticks of an official
/// Pro Controller.
pub const DEFAULT_STICK_CALIBRATION: [StickFactoryCalibration; 2] = [
    StickFactoryCalibration {
        data: [0xe6, 0xa5, 0x67, 0x1a, 0x58, 0x78, 0x50, 0x56, 0x60],
    },
    StickFactoryCalibration {
        data: [0x1a, 0xf8, 0x7f, 0x20, 0xc6, 0x63, 0xd5, 0x15, 0x5e],
    },
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The colour quad reported to the console
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerColors {
    pub body: RgbColor,
    pub buttons: RgbColor,
    pub left_grip: RgbColor,
    pub right_grip: RgbColor,
}

impl ControllerColors {
    /// Returns the colours in the 12-byte layout stored in SPI flash
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut bytes = [0; 12];
        let colors = [self.body, self.buttons, self.left_grip, self.right_grip];
        for (chunk, color) in bytes.chunks_exact_mut(3).zip(colors) {
            chunk.copy_from_slice(&[color.r, color.g, color.b]);
        }
        bytes
    }
}

impl Default for ControllerColors {
    fn default() -> Self {
        PRO_CONTROLLER_COLORS
    }
}

pub const PRO_CONTROLLER_COLORS: ControllerColors = ControllerColors {
    body: RgbColor::new(0x32, 0x32, 0x32),
    buttons: RgbColor::new(0xe6, 0xe6, 0xe6),
    left_grip: RgbColor::new(0x46, 0x46, 0x46),
    right_grip: RgbColor::new(0x46, 0x46, 0x46),
};
