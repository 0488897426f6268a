//! I2C driver backed by the Linux `i2c-dev` character devices (`/dev/i2c-N`).
use crate::{check_address, HalError, HalResult, I2cDevice, I2cDriver, MAX_ADDRESS};
use bitvec::vec::BitVec;
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CBus, LinuxI2CDevice, LinuxI2CError};
use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicU8;

/// I2C driver that uses the kernel `i2c-dev` interface through the `i2cdev` crate.
pub struct DevI2cDriver {
    bus: u8,
    path: PathBuf,
    used_addresses: BitVec<AtomicU8>,
}

impl From<LinuxI2CError> for HalError {
    fn from(err: LinuxI2CError) -> Self {
        io::Error::from(err).into()
    }
}

impl DevI2cDriver {
    /// Opens `/dev/i2c-<bus>`, failing early if the bus does not exist.
    pub fn new(bus: u8) -> HalResult<Self> {
        let path = PathBuf::from(format!("/dev/i2c-{}", bus));
        LinuxI2CBus::new(&path)?;

        Ok(DevI2cDriver {
            bus,
            path,
            used_addresses: BitVec::repeat(false, MAX_ADDRESS as usize + 1),
        })
    }
}

impl Debug for DevI2cDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DevI2cDriver({})", self.path.display())
    }
}

impl I2cDriver for DevI2cDriver {
    fn bus(&self) -> u8 {
        self.bus
    }

    fn get_device(&self, address: u8) -> HalResult<Box<dyn I2cDevice + '_>> {
        check_address(address)?;

        let index = address as usize;
        if self.used_addresses[index] {
            return Err(HalError::AlreadyInUse);
        }

        let device = LinuxI2CDevice::new(&self.path, address as u16)?;
        self.used_addresses.set_aliased(index, true);

        Ok(Box::new(DevI2cDevice {
            driver: self,
            address,
            device: RefCell::new(device),
        }))
    }
}

struct DevI2cDevice<'a> {
    driver: &'a DevI2cDriver,
    address: u8,
    device: RefCell<LinuxI2CDevice>,
}

impl Debug for DevI2cDevice<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{:#04x}]", self.driver, self.address)
    }
}

impl I2cDevice for DevI2cDevice<'_> {
    fn address(&self) -> u8 {
        self.address
    }

    fn write_byte(&self, value: u8) -> HalResult<()> {
        self.device.borrow_mut().smbus_write_byte(value)?;
        trace!("Wrote byte: address={:#04x} value={}", self.address, value);
        Ok(())
    }

    fn read_byte(&self) -> HalResult<u8> {
        let value = self.device.borrow_mut().smbus_read_byte()?;
        trace!("Read byte: address={:#04x} value={}", self.address, value);
        Ok(value)
    }
}

impl Drop for DevI2cDevice<'_> {
    fn drop(&mut self) {
        self.driver.used_addresses.set_aliased(self.address as usize, false);
    }
}
