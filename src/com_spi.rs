use core::fmt::Debug;

use embedded_hal::blocking::spi;
use embedded_hal::digital::v2::OutputPin;
use log::trace;
use thiserror::Error;

use super::com::Com;
use crate::register::Register;

#[derive(Error, Debug)]
pub enum SpiError<E: Debug, PE: Debug> {
    #[error("spi transfer failed: {0:?}")]
    Spi(E),
    #[error("chip select pin failed: {0:?}")]
    Nss(PE),
}

/// MFRC522 reached over SPI, with the chip select driven in software.
pub struct ComSpi<SPI, NSS> {
    spi: SPI,
    nss: NSS,
}

impl<SPI, NSS> ComSpi<SPI, NSS> {
    pub fn new(spi: SPI, nss: NSS) -> Self {
        Self { spi, nss }
    }

    pub fn release(self) -> (SPI, NSS) {
        (self.spi, self.nss)
    }

    fn read_address(reg: Register) -> u8 {
        ((reg.addr() << 1) | 0b1000_0000) & 0b1111_1110
    }

    fn write_address(reg: Register) -> u8 {
        (reg.addr() << 1) & 0b0111_1110
    }
}

impl<SPI, NSS, PE> ComSpi<SPI, NSS>
where
    NSS: OutputPin<Error = PE>,
    PE: Debug,
{
    fn with_nss_low<F, T, E>(&mut self, f: F) -> Result<T, SpiError<E, PE>>
    where
        F: FnOnce(&mut SPI) -> Result<T, E>,
        E: Debug,
    {
        self.nss.set_low().map_err(SpiError::Nss)?;
        let result = f(&mut self.spi).map_err(SpiError::Spi);
        let released = self.nss.set_high().map_err(SpiError::Nss);

        // A transfer error outranks the pin error on release.
        let value = result?;
        released?;
        Ok(value)
    }
}

impl<SPI, NSS, E, PE> Com for ComSpi<SPI, NSS>
where
    SPI: spi::Transfer<u8, Error = E> + spi::Write<u8, Error = E>,
    NSS: OutputPin<Error = PE>,
    E: Debug,
    PE: Debug,
{
    type Error = SpiError<E, PE>;

    fn read_register(&mut self, reg: Register) -> Result<u8, Self::Error> {
        let mut buffer = [Self::read_address(reg), 0];
        let value = self.with_nss_low(|spi| spi.transfer(&mut buffer).map(|rx| rx[1]))?;
        trace!("spi read {:?} = {:#04x}", reg, value);
        Ok(value)
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::Error> {
        trace!("spi write {:?} = {:#04x}", reg, value);
        let address = Self::write_address(reg);
        self.with_nss_low(|spi| spi.write(&[address, value]))
    }
}
