use thiserror::Error;

use crate::bluetooth::Address;

pub mod switch_passthrough;
pub mod switch_pro;
#[cfg(test)]
mod switch_pro_test;

/// Possible errors when writing reports to the console transport
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("device {0} is not connected")]
    Disconnected(Address),
    #[error("report of {0} bytes exceeds the transport limit")]
    ReportTooLarge(usize),
    #[error("transport write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A [ReportSink] is the transport connecting an emulated controller to the
/// console and, for forwarded controllers, to the physical device.
pub trait ReportSink {
    /// Write an input or reply report to the console on behalf of the given
    /// device.
    fn write_report(&mut self, address: &Address, report: &[u8]) -> Result<(), SinkError>;

    /// Send an output report to the physical device with the given address.
    fn send_report(&mut self, address: &Address, report: &[u8]) -> Result<(), SinkError>;
}
