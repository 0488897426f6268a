use std::ops::RangeInclusive;
use log::trace;
use fidget_hal::{I2cDriver, MAX_ADDRESS};

/// Addresses outside this range are reserved by the I2C specification.
pub const VALID_ADDRESSES: RangeInclusive<u8> = 0x08..=0x77;

/// Checks whether a slave answers a single-byte read at `address`.
///
/// Works for any 7-bit address, reserved ones included.
pub fn answers(driver: &dyn I2cDriver, address: u8) -> bool {
    let device = match driver.get_device(address) {
        Ok(device) => device,
        Err(e) => {
            trace!("Skipping {:#04x}: {}", address, e);
            return false;
        }
    };
    device.read_byte().is_ok()
}

/// Probes every valid address and returns the ones that answered.
pub fn scan(driver: &dyn I2cDriver) -> Vec<u8> {
    VALID_ADDRESSES
        .filter(|&address| answers(driver, address))
        .collect()
}

/// Renders the scan result as a 16-column grid, one row per high nibble.
pub fn render_grid(present: &[u8]) -> String {
    let mut grid = String::from("    ");
    for col in 0..0x10 {
        grid.push_str(&format!(" {:x} ", col));
    }
    grid.push('\n');

    for address in 0..=MAX_ADDRESS {
        if address % 0x10 == 0 {
            grid.push_str(&format!("{:02x}: ", address));
        }
        if present.contains(&address) {
            grid.push_str(&format!("{:02x}", address));
        } else if VALID_ADDRESSES.contains(&address) {
            grid.push_str("--");
        } else {
            grid.push_str("  ");
        }
        grid.push(if address % 0x10 == 0x0F { '\n' } else { ' ' });
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use fidget_hal::loopback::LoopbackI2cDriver;

    #[test]
    fn finds_only_answering_slaves() {
        let driver = LoopbackI2cDriver::new(1);
        driver.push_reply(0x04, 0);
        driver.push_reply(0x10, 0);
        driver.push_reply(0x40, 0);

        // 0x04 is reserved and never probed.
        assert_eq!(scan(&driver), vec![0x10, 0x40]);
    }

    #[test]
    fn reserved_slave_address_can_be_checked_directly() {
        let driver = LoopbackI2cDriver::new(1);
        driver.push_reply(0x04, 0);

        assert!(!scan(&driver).contains(&0x04));
        assert!(answers(&driver, 0x04));
        assert!(!answers(&driver, 0x05));
    }

    #[test]
    fn skips_claimed_addresses() {
        let driver = LoopbackI2cDriver::new(1);
        driver.push_reply(0x10, 0);
        let _claimed = driver.get_device(0x10).unwrap();

        assert!(scan(&driver).is_empty());
    }

    #[test]
    fn grid_marks_present_and_reserved_addresses() {
        let grid = render_grid(&[0x10]);
        let lines: Vec<&str> = grid.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("     0  1  2"));
        assert!(lines[1].starts_with("00:                         -- --"));
        assert!(lines[2].starts_with("10: 10 -- --"));
        assert!(lines[8].starts_with("70: -- -- -- -- -- -- -- --   "));
    }
}
