pub mod flash;
pub mod profile;
pub mod rumble;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use flash::handle_flash;
use profile::handle_profile;
use rumble::handle_rumble;

use crate::{bluetooth::Address, config::EmulatorConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the emulator configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the profile used for a controller
    Profile {
        /// Bluetooth address of the controller (e.g. "98:B6:E9:01:02:03")
        address: Address,
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump a region of the virtual SPI flash of a controller
    Flash {
        /// Bluetooth address of the controller (e.g. "98:B6:E9:01:02:03")
        address: Address,
        /// Start address of the region to dump
        #[arg(long, value_parser = parse_number::<u32>, default_value = "0x6000")]
        offset: u32,
        /// Number of bytes to dump
        #[arg(long, value_parser = parse_number::<u32>, default_value = "0x80")]
        size: u32,
    },
    /// Decode a 4-byte rumble command sent by the console
    Rumble {
        #[arg(value_parser = parse_number::<u8>, num_args = 4, required = true)]
        command: Vec<u8>,
    },
}

pub fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match args.config.as_ref() {
        Some(path) => {
            log::debug!("Loading configuration from {path:?}");
            EmulatorConfig::from_yaml_file(path)?
        }
        None => EmulatorConfig::default(),
    };

    match args.cmd {
        Commands::Profile { address, json } => handle_profile(&config, &address, json)?,
        Commands::Flash {
            address,
            offset,
            size,
        } => handle_flash(&config, &address, offset, size)?,
        Commands::Rumble { command } => handle_rumble(&command)?,
    }

    Ok(())
}

/// Parse a decimal or "0x" prefixed hexadecimal number
fn parse_number<T>(value: &str) -> Result<T, String>
where
    T: TryFrom<u64>,
{
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    let number = parsed.map_err(|e| format!("invalid number `{value}`: {e}"))?;
    T::try_from(number).map_err(|_| format!("number `{value}` is out of range"))
}
