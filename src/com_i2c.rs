use core::fmt::Debug;

use embedded_hal::blocking::i2c;
use log::trace;

use super::com::Com;
use crate::register::Register;

/// Address of the MFRC522 with its I2C address pins tied low.
pub const DEFAULT_ADDRESS: u8 = 0x28;

/// MFRC522 reached over I2C. The register address is sent as-is.
pub struct ComI2c<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> ComI2c<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Com for ComI2c<I2C>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    E: Debug,
{
    type Error = E;

    fn read_register(&mut self, reg: Register) -> Result<u8, E> {
        let mut value = [0u8; 1];
        self.i2c.write(self.addr, &[reg.addr()])?;
        self.i2c.read(self.addr, &mut value)?;
        trace!("i2c {:#04x} read {:?} = {:#04x}", self.addr, reg, value[0]);
        Ok(value[0])
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), E> {
        trace!("i2c {:#04x} write {:?} = {:#04x}", self.addr, reg, value);
        self.i2c.write(self.addr, &[reg.addr(), value])
    }
}
