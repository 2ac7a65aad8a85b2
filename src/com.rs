use core::fmt::Debug;

use crate::register::Register;

/// Single-register access to the MFRC522.
///
/// Each call is one complete request/response exchange on the bus. Errors are
/// transport failures only; the driver never retries them.
pub trait Com {
    type Error: Debug;

    fn read_register(&mut self, reg: Register) -> Result<u8, Self::Error>;
    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::Error>;
}

