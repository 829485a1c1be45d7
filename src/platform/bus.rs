// Wand — I2C with bounded transactions
//
// esp-idf-hal's embedded-hal impl waits forever on a stuck bus.  This wrapper
// routes every transaction through the driver's timeout-taking variant so a
// hung accelerometer surfaces as a read error instead of freezing dispatch.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use esp_idf_hal::i2c::I2cDriver;

use crate::config::I2C_TIMEOUT_TICKS;

pub struct TimedI2c {
    driver: I2cDriver<'static>,
}

impl TimedI2c {
    pub fn new(driver: I2cDriver<'static>) -> Self {
        Self { driver }
    }
}

impl ErrorType for TimedI2c {
    type Error = ErrorKind;
}

impl I2c for TimedI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.driver
            .transaction(address, operations, I2C_TIMEOUT_TICKS)
            .map_err(|e| {
                log::debug!("I2C transaction to 0x{:02X} failed: {}", address, e);
                ErrorKind::Other
            })
    }
}
