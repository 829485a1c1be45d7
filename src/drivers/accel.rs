// Wand — LIS3DH Accelerometer Driver
//
// Register-level driver over any embedded-hal I2C bus.  Only what the wand
// needs: normal sampling, single-axis reads at 8-bit resolution, and the
// low-power Y-motion wake configuration.

use embedded_hal::i2c::I2c;
use thiserror::Error;

use crate::events::Axis;
use crate::hal::AxisSource;

// LIS3DH register addresses
const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL_REG1: u8 = 0x20;
const REG_CTRL_REG6: u8 = 0x25;
const REG_OUT_X_L: u8 = 0x28;
const REG_OUT_Y_L: u8 = 0x2A;
const REG_OUT_Z_L: u8 = 0x2C;
const REG_INT1_CFG: u8 = 0x30;
const REG_INT1_THS: u8 = 0x32;
const REG_INT1_DUR: u8 = 0x33;

/// Sub-address MSB enables register auto-increment for burst reads.
const AUTO_INCREMENT: u8 = 0x80;
const WHO_AM_I_EXPECTED: u8 = 0x33;

const CTRL1_100HZ_XYZ: u8 = 0x57;
const CTRL1_1HZ_LOW_POWER_Y: u8 = 0x1A;
const CTRL6_INT1_ON_PAD2_ACTIVE_LOW: u8 = 0x42;
const INT1_CFG_OFF: u8 = 0x00;
const INT1_CFG_Y_HIGH: u8 = 0x88;
const INT1_THRESHOLD: u8 = 0x20;
const INT1_DURATION: u8 = 0x01;

#[derive(Debug, Error)]
pub enum AccelError<E: core::fmt::Debug> {
    #[error("I2C bus error: {0:?}")]
    Bus(E),
    #[error("unexpected WHO_AM_I 0x{0:02X}")]
    UnexpectedDevice(u8),
}

pub struct Lis3dh<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Lis3dh<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn who_am_i(&mut self) -> Result<u8, AccelError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[REG_WHO_AM_I], &mut buf)
            .map_err(AccelError::Bus)?;
        Ok(buf[0])
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&mut self) -> bool {
        matches!(self.who_am_i(), Ok(WHO_AM_I_EXPECTED))
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), AccelError<I2C::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(AccelError::Bus)
    }
}

impl<I2C: I2c> AxisSource for Lis3dh<I2C> {
    type Error = AccelError<I2C::Error>;

    /// 100 Hz, normal mode, all axes; motion interrupt off.
    fn init(&mut self) -> Result<(), Self::Error> {
        let id = self.who_am_i()?;
        if id != WHO_AM_I_EXPECTED {
            return Err(AccelError::UnexpectedDevice(id));
        }
        self.write_reg(REG_CTRL_REG1, CTRL1_100HZ_XYZ)?;
        self.write_reg(REG_INT1_CFG, INT1_CFG_OFF)?;
        log::info!("LIS3DH initialised (100 Hz, XYZ)");
        Ok(())
    }

    /// Signed high byte of the left-justified output register pair.
    fn read_axis(&mut self, axis: Axis) -> Result<i16, Self::Error> {
        let reg = match axis {
            Axis::X => REG_OUT_X_L,
            Axis::Y => REG_OUT_Y_L,
            Axis::Z => REG_OUT_Z_L,
        };
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg | AUTO_INCREMENT], &mut raw)
            .map_err(AccelError::Bus)?;
        Ok(i16::from_le_bytes(raw) >> 8)
    }

    /// 1 Hz low-power sampling of Y only, interrupt on a Y-high event routed
    /// to pad 2, active low.
    fn enter_low_power_interrupt_mode(&mut self) -> Result<(), Self::Error> {
        self.write_reg(REG_CTRL_REG1, CTRL1_1HZ_LOW_POWER_Y)?;
        self.write_reg(REG_CTRL_REG6, CTRL6_INT1_ON_PAD2_ACTIVE_LOW)?;
        self.write_reg(REG_INT1_CFG, INT1_CFG_Y_HIGH)?;
        self.write_reg(REG_INT1_THS, INT1_THRESHOLD)?;
        self.write_reg(REG_INT1_DUR, INT1_DURATION)?;
        log::info!("LIS3DH in low-power wake mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Register file behind a fake bus; records every register write.
    struct FakeBus {
        regs: [u8; 0x40],
        writes: Vec<(u8, u8)>,
        fail: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                regs: [0; 0x40],
                writes: Vec::new(),
                fail: false,
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            assert_eq!(address, 0x18);
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut pointer = 0usize;
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        pointer = usize::from(bytes[0] & 0x7F);
                        if let Some(&value) = bytes.get(1) {
                            self.regs[pointer] = value;
                            self.writes.push((bytes[0], value));
                        }
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.regs[pointer + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn device() -> Lis3dh<FakeBus> {
        let mut bus = FakeBus::new();
        bus.regs[usize::from(REG_WHO_AM_I)] = WHO_AM_I_EXPECTED;
        Lis3dh::new(bus, 0x18)
    }

    #[test]
    fn init_configures_normal_sampling() {
        let mut dev = device();
        dev.init().unwrap();
        assert!(dev.is_connected());
        assert_eq!(dev.release().writes, vec![(0x20, 0x57), (0x30, 0x00)]);
    }

    #[test]
    fn init_rejects_other_devices() {
        let mut bus = FakeBus::new();
        bus.regs[usize::from(REG_WHO_AM_I)] = 0x6A;
        let mut dev = Lis3dh::new(bus, 0x18);
        assert!(matches!(dev.init(), Err(AccelError::UnexpectedDevice(0x6A))));
    }

    #[test]
    fn read_axis_returns_signed_high_byte() {
        let mut dev = device();
        {
            let regs = &mut dev.i2c.regs;
            regs[0x28] = 0xC0;
            regs[0x29] = 0x14; // +20
            regs[0x2A] = 0x00;
            regs[0x2B] = 0xEC; // -20
            regs[0x2C] = 0xFF;
            regs[0x2D] = 0x7F; // +127
        }
        assert_eq!(dev.read_axis(Axis::X).unwrap(), 20);
        assert_eq!(dev.read_axis(Axis::Y).unwrap(), -20);
        assert_eq!(dev.read_axis(Axis::Z).unwrap(), 127);
    }

    #[test]
    fn low_power_mode_register_sequence() {
        let mut dev = device();
        dev.enter_low_power_interrupt_mode().unwrap();
        assert_eq!(
            dev.release().writes,
            vec![(0x20, 0x1A), (0x25, 0x42), (0x30, 0x88), (0x32, 0x20), (0x33, 0x01)]
        );
    }

    #[test]
    fn bus_errors_propagate() {
        let mut dev = device();
        dev.i2c.fail = true;
        assert!(matches!(dev.read_axis(Axis::X), Err(AccelError::Bus(ErrorKind::Other))));
        assert!(!dev.is_connected());
    }
}
