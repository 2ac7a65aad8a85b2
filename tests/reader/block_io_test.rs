use proptest::prelude::*;
use rc522::com_sim::SimChip;
use rc522::{picc, PiccReader};

use crate::common::*;

#[test]
fn write_then_read_round_trips() {
    let (mut reader, _) = authenticated(5);
    let data = [
        0x42, 0x66, 0x13, 0x69, 0x42, 0x66, 0x13, 0x69, 0x42, 0x66, 0x13, 0x69, 0x42, 0x66, 0x13,
        0x69,
    ];

    assert!(reader.write_sector(5, &data).unwrap());
    assert_eq!(reader.read_sector(5).unwrap(), Some(data));
}

#[test]
fn read_outside_authenticated_sector_fails() {
    let (mut reader, _) = authenticated(4);
    assert_eq!(reader.read_sector(4).unwrap(), Some([0u8; 16]));
    assert_eq!(reader.read_sector(8).unwrap(), None);
}

#[test]
fn refused_write_never_sends_data() {
    let mut chip = SimChip::with_card(sample_card());
    chip.write_ack = 0x05;
    let mut reader = reader_with(chip);
    let uid = select(&mut reader);
    assert!(reader.authenticate(4, &picc::DEFAULT_KEY, &uid).unwrap());

    assert!(!reader.write_sector(4, &[0xEE; 16]).unwrap());

    let frames = &reader.com_mut().frames;
    assert_eq!(frames.last().map(|f| f[0]), Some(0xA0));
    assert!(frames.iter().all(|f| f.len() != 18));
    assert_eq!(
        reader.com_mut().card.as_ref().unwrap().blocks[4],
        [0u8; 16]
    );
}

#[test]
fn write_without_authentication_fails() {
    let mut reader = reader_with_card();
    select(&mut reader);

    assert!(!reader.write_sector(4, &[0x11; 16]).unwrap());
}

#[test]
fn halted_card_stops_answering() {
    let mut reader = reader_with_card();
    select(&mut reader);

    assert!(reader.halt().unwrap());
    assert!(!reader.detect_card().unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_block_round_trips(block in 1u8..63, data in any::<[u8; 16]>()) {
        let (mut reader, _) = authenticated(block);

        prop_assert!(reader.write_sector(block, &data).unwrap());
        prop_assert_eq!(reader.read_sector(block).unwrap(), Some(data));
    }
}
