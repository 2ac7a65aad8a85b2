// Shared reader setup for the integration tests.

#![allow(dead_code)]

use rc522::com_sim::{SimCard, SimChip, SimDelay, SimPin};
use rc522::{picc, Config, Mfrc522, PiccReader, Uid};

pub type SimReader = Mfrc522<SimChip, SimPin, SimDelay>;

pub const SAMPLE_UID: [u8; 4] = [0x9A, 0x3F, 0x12, 0xC4];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn sample_card() -> SimCard {
    SimCard::new(SAMPLE_UID)
}

/// Initialized reader with `chip` behind it.
pub fn reader_with(chip: SimChip) -> SimReader {
    init_logger();
    let mut reader = Mfrc522::new(chip, SimPin::default(), SimDelay::default(), Config::default());
    reader.initialize().expect("initialize");
    reader
}

pub fn reader_with_card() -> SimReader {
    reader_with(SimChip::with_card(sample_card()))
}

/// Drives detect, resolve and select; panics if any step fails.
pub fn select(reader: &mut SimReader) -> Uid {
    assert!(reader.detect_card().unwrap(), "card not detected");
    let uid = reader.resolve_uid().unwrap().expect("uid");
    assert!(reader.select_card(&uid).unwrap(), "select rejected");
    uid
}

/// Selected and authenticated for the sector holding `block`.
pub fn authenticated(block: u8) -> (SimReader, Uid) {
    let mut reader = reader_with_card();
    let uid = select(&mut reader);
    assert!(reader
        .authenticate(block, &picc::DEFAULT_KEY, &uid)
        .unwrap());
    (reader, uid)
}
