//! Software I2C driver that never touches hardware.
//!
//! Every device remembers the bytes written to it and, when read, echoes the
//! last one back, the same way the robot firmware acknowledges a command.
//! Replies (or faults) can be queued to take precedence over the echo.
use crate::{check_address, HalError, HalResult, I2cDevice, I2cDriver, MAX_ADDRESS};
use bitvec::vec::BitVec;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt::{Debug, Formatter};
use std::io;
use std::sync::atomic::AtomicU8;

#[derive(Default)]
struct LoopbackSlave {
    written: Vec<u8>,
    replies: VecDeque<HalResult<u8>>,
}

pub struct LoopbackI2cDriver {
    bus: u8,
    slaves: RefCell<HashMap<u8, LoopbackSlave>>,
    used_addresses: BitVec<AtomicU8>,
}

impl LoopbackI2cDriver {
    pub fn new(bus: u8) -> Self {
        Self {
            bus,
            slaves: RefCell::new(HashMap::new()),
            used_addresses: BitVec::repeat(false, MAX_ADDRESS as usize + 1),
        }
    }

    /// Gets every byte written to the slave at `address`, oldest first.
    pub fn written(&self, address: u8) -> Vec<u8> {
        self.slaves
            .borrow()
            .get(&address)
            .map(|slave| slave.written.clone())
            .unwrap_or_default()
    }

    /// Queues a byte the slave at `address` will answer with on the next read.
    pub fn push_reply(&self, address: u8, value: u8) {
        self.slaves
            .borrow_mut()
            .entry(address)
            .or_default()
            .replies
            .push_back(Ok(value));
    }

    /// Queues a failure for the next read of the slave at `address`.
    pub fn push_fault(&self, address: u8, error: HalError) {
        self.slaves
            .borrow_mut()
            .entry(address)
            .or_default()
            .replies
            .push_back(Err(error));
    }

    fn raw_write_byte(&self, address: u8, value: u8) -> HalResult<()> {
        self.slaves
            .borrow_mut()
            .entry(address)
            .or_default()
            .written
            .push(value);
        Ok(())
    }

    fn raw_read_byte(&self, address: u8) -> HalResult<u8> {
        let mut slaves = self.slaves.borrow_mut();
        let slave = slaves.entry(address).or_default();

        if let Some(reply) = slave.replies.pop_front() {
            return reply;
        }

        slave
            .written
            .last()
            .copied()
            .ok_or(HalError::Io(io::ErrorKind::WouldBlock))
    }
}

impl Debug for LoopbackI2cDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoopbackI2cDriver({})", self.bus)
    }
}

impl I2cDriver for LoopbackI2cDriver {
    fn bus(&self) -> u8 {
        self.bus
    }

    fn get_device(&self, address: u8) -> HalResult<Box<dyn I2cDevice + '_>> {
        check_address(address)?;

        let index = address as usize;
        if self.used_addresses[index] {
            return Err(HalError::AlreadyInUse);
        }

        self.used_addresses.set_aliased(index, true);

        Ok(Box::new(LoopbackI2cDevice {
            driver: self,
            address,
        }))
    }
}

struct LoopbackI2cDevice<'a> {
    driver: &'a LoopbackI2cDriver,
    address: u8,
}

impl Debug for LoopbackI2cDevice<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{:#04x}]", self.driver, self.address)
    }
}

impl I2cDevice for LoopbackI2cDevice<'_> {
    fn address(&self) -> u8 {
        self.address
    }

    fn write_byte(&self, value: u8) -> HalResult<()> {
        self.driver.raw_write_byte(self.address, value)
    }

    fn read_byte(&self) -> HalResult<u8> {
        self.driver.raw_read_byte(self.address)
    }
}

impl Drop for LoopbackI2cDevice<'_> {
    fn drop(&mut self) {
        self.driver.used_addresses.set_aliased(self.address as usize, false);
    }
}
