//! Console-facing side of the Nintendo Switch Pro Controller protocol.
pub mod hid_report;
pub mod rumble;
pub mod spi;
pub mod subcommand;
pub mod virtual_flash;
