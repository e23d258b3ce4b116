use crate::drivers::switch::hid_report::{BatteryLevel, ButtonStatus, ImuData, StickData};

/// Canonical controller state decoded by a source driver from a vendor
/// report. The state is replaced wholesale on every processed report, and
/// its default is a released controller with centered sticks and a full
/// battery.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ControllerState {
    pub buttons: ButtonStatus,
    pub left_stick: StickData,
    pub right_stick: StickData,
    /// Three consecutive motion samples. Devices without motion sensors
    /// leave these zeroed.
    pub motion: [ImuData; 3],
    pub battery: BatteryLevel,
    pub charging: bool,
}

