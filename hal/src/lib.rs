//! Host-side drivers for the Fidget controller: the I2C bus towards the
//! microcontroller and the keyboard the operator drives it with.

pub mod dev;
pub mod keyboard;
pub mod loopback;

use std::fmt::Debug;
use thiserror::Error;

/// The highest valid 7-bit I2C address.
pub const MAX_ADDRESS: u8 = 0x7F;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum HalError {
    #[error("address already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for HalError {
    fn from(err: std::io::Error) -> Self {
        HalError::Io(err.kind())
    }
}

pub type HalResult<T> = Result<T, HalError>;

pub trait I2cDriver: Debug {
    /// Gets the number of the bus this driver talks to.
    fn bus(&self) -> u8;

    /// Claims the slave device at the given 7-bit address.
    ///
    /// # Errors
    /// - `HalError::InvalidArgument` if the address does not fit in 7 bits.
    /// - `HalError::AlreadyInUse` if the address is already claimed on this driver.
    fn get_device(&self, address: u8) -> HalResult<Box<dyn I2cDevice + '_>>;
}

/// A single slave on an I2C bus, addressed with SMBus byte transfers.
pub trait I2cDevice: Debug {
    /// Gets the 7-bit address of the device.
    fn address(&self) -> u8;

    /// Sends a single data byte to the device, without a register ("send byte").
    fn write_byte(&self, value: u8) -> HalResult<()>;

    /// Reads a single data byte from the device, without a register ("receive byte").
    fn read_byte(&self) -> HalResult<u8>;
}

pub(crate) fn check_address(address: u8) -> HalResult<()> {
    if address > MAX_ADDRESS {
        return Err(HalError::InvalidArgument);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_errors_keep_their_kind() {
        let err: HalError = io::Error::new(io::ErrorKind::TimedOut, "nack").into();
        assert_eq!(err, HalError::Io(io::ErrorKind::TimedOut));
        assert_eq!(err.to_string(), "IO error: timed out");
    }

    #[test]
    fn addresses_above_seven_bits_are_rejected() {
        assert!(check_address(0x04).is_ok());
        assert!(check_address(MAX_ADDRESS).is_ok());
        assert_eq!(check_address(0x80), Err(HalError::InvalidArgument));
    }
}
