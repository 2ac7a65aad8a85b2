use rc522::com_sim::SimChip;
use rc522::{picc, PiccReader};

use crate::common::*;

#[test]
fn default_key_authenticates() {
    let mut reader = reader_with_card();
    let uid = select(&mut reader);

    assert!(reader.authenticate(4, &picc::DEFAULT_KEY, &uid).unwrap());
    let frame = reader.com_mut().frames.last().cloned().unwrap();
    assert_eq!(frame[0], 0x60);
    assert_eq!(frame[1], 4);
    assert_eq!(&frame[2..8], &picc::DEFAULT_KEY);
    assert_eq!(&frame[8..], uid.as_bytes());
}

#[test]
fn wrong_key_is_refused() {
    let mut reader = reader_with_card();
    let uid = select(&mut reader);

    assert!(!reader.authenticate(4, &[0x00; 6], &uid).unwrap());
}

#[test]
fn missing_crypto_bit_fails_despite_ok_status() {
    let mut chip = SimChip::with_card(sample_card());
    chip.suppress_crypto = true;
    let mut reader = reader_with(chip);
    let uid = select(&mut reader);

    assert!(!reader.authenticate(4, &picc::DEFAULT_KEY, &uid).unwrap());
    assert_eq!(reader.com_mut().register(rc522::Register::Status2) & 0x08, 0);
}

#[test]
fn stop_crypto_clears_crypto_bit() {
    let (mut reader, _) = authenticated(8);
    assert_eq!(reader.com_mut().register(rc522::Register::Status2) & 0x08, 0x08);

    reader.stop_crypto().unwrap();

    assert_eq!(reader.com_mut().register(rc522::Register::Status2) & 0x08, 0);
    assert_eq!(reader.read_sector(8).unwrap(), None);
}

#[test]
fn custom_sector_key() {
    let key = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5];
    let mut reader = reader_with(SimChip::with_card(sample_card().with_key(key)));
    let uid = select(&mut reader);

    assert!(!reader.authenticate(4, &picc::DEFAULT_KEY, &uid).unwrap());

    // a refused key drops the card back to idle
    let uid = select(&mut reader);
    assert!(reader.authenticate(4, &key, &uid).unwrap());
}
