use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::drivers::switch::rumble::{decode, RUMBLE_COMMAND_SIZE};

#[derive(Tabled)]
struct BandRow {
    #[tabled(rename = "Band")]
    band: &'static str,
    #[tabled(rename = "Frequency (Hz)")]
    frequency: f32,
    #[tabled(rename = "Amplitude")]
    amplitude: f32,
}

pub fn handle_rumble(command: &[u8]) -> Result<(), Box<dyn Error>> {
    let command: [u8; RUMBLE_COMMAND_SIZE] = command
        .try_into()
        .map_err(|_| format!("Expected {RUMBLE_COMMAND_SIZE} bytes, got {}", command.len()))?;
    let sample = decode(&command)?;

    let rows = vec![
        BandRow {
            band: "High",
            frequency: sample.high_band_freq,
            amplitude: sample.high_band_amp,
        },
        BandRow {
            band: "Low",
            frequency: sample.low_band_freq,
            amplitude: sample.low_band_amp,
        },
    ];
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header(format!("Rumble {command:02x?}")));
    println!("{table}");

    Ok(())
}
