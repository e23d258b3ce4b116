use std::error::Error;

use crate::{
    bluetooth::Address,
    config::EmulatorConfig,
    drivers::switch::{
        spi::{DEFAULT_STICK_CALIBRATION, SPI_FLASH_SIZE},
        virtual_flash::VirtualFlashStore,
    },
};

/// Number of bytes shown per line of the hex dump
const LINE_SIZE: usize = 16;

pub fn handle_flash(
    config: &EmulatorConfig,
    address: &Address,
    offset: u32,
    size: u32,
) -> Result<(), Box<dyn Error>> {
    if offset as usize >= SPI_FLASH_SIZE {
        return Err(format!("Offset {offset:#06x} is outside of the SPI flash").into());
    }
    let size = (size as usize).min(SPI_FLASH_SIZE - offset as usize);

    let store = VirtualFlashStore::new(config);
    let mut flash = store.get_or_create(address, &DEFAULT_STICK_CALIBRATION)?;
    let mut data = vec![0; size];
    flash.read(offset, &mut data)?;
    println!("{:?}", flash.path());
    flash.close()?;

    for line in hex_dump(offset, &data) {
        println!("{line}");
    }

    Ok(())
}

/// Format the given data as lines of hex bytes prefixed by their address
fn hex_dump(offset: u32, data: &[u8]) -> Vec<String> {
    data.chunks(LINE_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
            let address = offset as usize + i * LINE_SIZE;
            format!("{address:06x}  {}", bytes.join(" "))
        })
        .collect()
}
