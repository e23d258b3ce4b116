//! Emulated controller SPI flash, persisted as a flat 64KB image per
//! controller.
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use thiserror::Error;

use crate::{
    bluetooth::Address,
    config::{
        path::{get_controller_path, SPI_FLASH_NAME},
        EmulatorConfig,
    },
};

use super::spi::{
    StickFactoryCalibration, CONTROLLER_COLORS_ADDRESS, PRO_CONTROLLER_COLORS, SPI_FLASH_SENTINEL,
    SPI_FLASH_SIZE, STICK_FACTORY_CALIBRATION_ADDRESS,
};

#[derive(Error, Debug)]
pub enum FlashError {
    #[error("virtual flash I/O error on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("virtual flash {path:?} has invalid size {size}, expected {SPI_FLASH_SIZE}")]
    InvalidSize { path: PathBuf, size: u64 },
    #[error("access of {len} bytes at {offset:#06x} is outside of the virtual flash")]
    OutOfBounds { offset: u32, len: usize },
}

/// Creates and opens the virtual flash image of each controller
#[derive(Debug, Clone)]
pub struct VirtualFlashStore {
    controllers_path: PathBuf,
}

impl VirtualFlashStore {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            controllers_path: config.controllers_path(),
        }
    }

    /// Returns the path to the flash image of the given controller
    pub fn image_path(&self, address: &Address) -> PathBuf {
        get_controller_path(&self.controllers_path, address).join(SPI_FLASH_NAME)
    }

    /// Open the flash image of the given controller for reading and writing,
    /// creating and initializing it with the given stick calibration if it
    /// does not exist yet.
    pub fn get_or_create(
        &self,
        address: &Address,
        calibration: &[StickFactoryCalibration; 2],
    ) -> Result<VirtualFlash, FlashError> {
        let path = self.image_path(address);
        let io_err = |source| FlashError::Io {
            path: path.clone(),
            source,
        };

        if !path.exists() {
            log::info!("Creating virtual SPI flash for {address} at {path:?}");
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(io_err)?;
            }
            let image = initial_image(calibration);
            fs::write(&path, image).map_err(io_err)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        let size = file.metadata().map_err(io_err)?.len();
        if size != SPI_FLASH_SIZE as u64 {
            return Err(FlashError::InvalidSize { path, size });
        }

        Ok(VirtualFlash { file, path })
    }
}

/// Build the contents of a new flash image. Everything except the stick
/// calibration and colours reads back as erased flash.
fn initial_image(calibration: &[StickFactoryCalibration; 2]) -> Vec<u8> {
    let mut image = vec![SPI_FLASH_SENTINEL; SPI_FLASH_SIZE];

    let offset = STICK_FACTORY_CALIBRATION_ADDRESS as usize;
    for (i, stick) in calibration.iter().enumerate() {
        let start = offset + i * stick.data.len();
        image[start..start + stick.data.len()].copy_from_slice(&stick.data);
    }

    let colors = PRO_CONTROLLER_COLORS.to_bytes();
    let offset = CONTROLLER_COLORS_ADDRESS as usize;
    image[offset..offset + colors.len()].copy_from_slice(&colors);

    image
}

/// Handle to an open virtual flash image
#[derive(Debug)]
pub struct VirtualFlash {
    file: File,
    path: PathBuf,
}

impl VirtualFlash {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Fill the given buffer with the flash contents at the given address
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.seek(address, buf.len())?;
        self.file.read_exact(buf).map_err(|source| self.io_err(source))
    }

    /// Write the given data to the flash at the given address
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        self.seek(address, data.len())?;
        self.file.write_all(data).map_err(|source| self.io_err(source))
    }

    /// Flush pending writes and release the image
    pub fn close(mut self) -> Result<(), FlashError> {
        log::debug!("Closing virtual SPI flash {:?}", self.path);
        self.file.flush().map_err(|source| self.io_err(source))?;
        self.file.sync_all().map_err(|source| self.io_err(source))
    }

    fn seek(&mut self, address: u32, len: usize) -> Result<(), FlashError> {
        let end = address as usize + len;
        if end > SPI_FLASH_SIZE {
            return Err(FlashError::OutOfBounds {
                offset: address,
                len,
            });
        }
        self.file
            .seek(SeekFrom::Start(address as u64))
            .map_err(|source| self.io_err(source))?;
        Ok(())
    }

    fn io_err(&self, source: io::Error) -> FlashError {
        FlashError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
