//! Driver for the MFRC522 contactless reader with enough of ISO/IEC 14443A and
//! MIFARE Classic to detect a card, resolve its UID, select it, authenticate a
//! sector and read or write blocks.
//!
//! The chip is reached through any [`com::Com`] transport (SPI and I2C over
//! `embedded-hal` are provided), a reset [`OutputPin`] and a blocking delay.
//!
//! ```no_run
//! # use rc522::com_sim::{SimChip, SimPin, SimDelay};
//! use rc522::{picc, Config, Mfrc522, PiccReader};
//!
//! # let (com, rst, delay) = (SimChip::new(), SimPin::default(), SimDelay::default());
//! let mut reader = Mfrc522::new(com, rst, delay, Config::default());
//! reader.initialize().unwrap();
//!
//! if reader.detect_card().unwrap() {
//!     if let Some(uid) = reader.resolve_uid().unwrap() {
//!         if reader.select_card(&uid).unwrap()
//!             && reader.authenticate(4, &picc::DEFAULT_KEY, &uid).unwrap()
//!         {
//!             println!("{}: {:02x?}", uid, reader.read_sector(4).unwrap());
//!             reader.stop_crypto().unwrap();
//!         }
//!     }
//! }
//! ```
//!
//! [`OutputPin`]: embedded_hal::digital::v2::OutputPin

use core::fmt::Debug;
use thiserror::Error;

pub mod com;
pub mod com_i2c;
pub mod com_sim;
pub mod com_spi;
pub mod config;
pub mod mfrc522;
pub mod picc;
pub mod register;
pub mod util;

pub use crate::config::Config;
pub use crate::mfrc522::Mfrc522;
pub use crate::picc::{Block, MifareKey, Uid};
pub use crate::register::{InvalidRegister, Register};

/// Hard failures. "No card", collisions, rejected authentication and the like
/// are ordinary results, not errors.
#[derive(Error, Debug)]
pub enum Error<E: Debug, PE: Debug> {
    /// The bus transaction failed; chip state is unknown until re-initialized.
    #[error("transport error: {0:?}")]
    Com(E),
    #[error("reset line error: {0:?}")]
    ResetLine(PE),
}

/// Operations of a PICC reader, in the order a caller normally drives them:
/// detect, resolve UID, select, authenticate, read/write, stop crypto.
///
/// Nothing here retries; polling for a card is up to the caller.
pub trait PiccReader {
    type Error;

    /// Hardware reset followed by a soft reset.
    fn initialize(&mut self) -> Result<(), Self::Error>;
    /// Stops the current command, turns the antenna off and holds the chip in reset.
    fn shutdown(&mut self) -> Result<(), Self::Error>;

    /// Sends REQA; true when a card answers with a 16 bit ATQA.
    fn detect_card(&mut self) -> Result<bool, Self::Error>;
    /// Cascade level 1 anti collision. `None` unless the reply is 4 UID bytes plus a matching BCC.
    fn resolve_uid(&mut self) -> Result<Option<Uid>, Self::Error>;
    fn select_card(&mut self, uid: &Uid) -> Result<bool, Self::Error>;
    /// Key A authentication of the sector holding block `sector`.
    fn authenticate(&mut self, sector: u8, key: &MifareKey, uid: &Uid)
        -> Result<bool, Self::Error>;
    fn stop_crypto(&mut self) -> Result<(), Self::Error>;
    fn read_sector(&mut self, sector: u8) -> Result<Option<Block>, Self::Error>;
    /// Two-phase MIFARE write; true only when both phases are acknowledged.
    fn write_sector(&mut self, sector: u8, data: &Block) -> Result<bool, Self::Error>;

    fn idle(&mut self) -> Result<(), Self::Error>;
    /// Soft reset command, then timer, modulation and antenna setup.
    fn soft_reset(&mut self) -> Result<(), Self::Error>;
    /// Pulses the reset line low for the configured duration.
    fn hardware_reset(&mut self) -> Result<(), Self::Error>;
}
