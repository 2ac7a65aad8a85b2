use proptest::prelude::*;
use rc522::com_sim::SimChip;
use rc522::{PiccReader, Uid};

use crate::common::*;

#[test]
fn two_byte_atqa_means_card_present() {
    let mut reader = reader_with_card();
    assert!(reader.detect_card().unwrap());
}

#[test]
fn eight_bit_atqa_is_not_a_card() {
    let mut chip = SimChip::with_card(sample_card());
    chip.atqa = vec![0x04];
    let mut reader = reader_with(chip);

    assert!(!reader.detect_card().unwrap());
}

#[test]
fn empty_field_reports_no_card() {
    let mut reader = reader_with(SimChip::new());
    assert!(!reader.detect_card().unwrap());
    assert_eq!(reader.resolve_uid().unwrap(), None);
}

#[test]
fn reqa_goes_out_as_short_frame() {
    let mut reader = reader_with_card();
    reader.detect_card().unwrap();

    let chip = reader.com_mut();
    assert_eq!(chip.frames.last(), Some(&vec![0x26]));
    assert_eq!(chip.register(rc522::Register::BitFraming) & 0x07, 0x07);
}

#[test]
fn resolves_and_selects_uid() {
    let mut reader = reader_with_card();
    let uid = select(&mut reader);

    assert_eq!(uid, Uid::new(SAMPLE_UID));
    let select_frame = reader.com_mut().frames.last().cloned().unwrap();
    assert_eq!(select_frame.len(), 9);
    assert_eq!(&select_frame[..2], &[0x93, 0x70]);
    assert_eq!(&select_frame[2..6], &SAMPLE_UID);
    assert_eq!(select_frame[6], uid.bcc());
}

#[test]
fn collision_yields_no_uid() {
    let mut chip = SimChip::with_card(sample_card());
    chip.collision = true;
    let mut reader = reader_with(chip);

    assert!(reader.detect_card().unwrap());
    assert_eq!(reader.resolve_uid().unwrap(), None);
}

#[test]
fn select_of_foreign_uid_is_rejected() {
    let mut reader = reader_with_card();
    assert!(reader.detect_card().unwrap());
    assert!(reader.resolve_uid().unwrap().is_some());

    assert!(!reader.select_card(&Uid::new([1, 2, 3, 4])).unwrap());
}

proptest! {
    #[test]
    fn corrupted_bcc_is_always_rejected(offset in 1u8..=255) {
        let mut chip = SimChip::with_card(sample_card());
        chip.bcc_override = Some(Uid::new(SAMPLE_UID).bcc() ^ offset);
        let mut reader = reader_with(chip);

        prop_assert!(reader.detect_card().unwrap());
        prop_assert_eq!(reader.resolve_uid().unwrap(), None);
    }
}

#[test]
fn removed_card_is_no_longer_detected() {
    let mut reader = reader_with_card();
    assert!(reader.detect_card().unwrap());
    reader.idle().unwrap();

    assert!(reader.com_mut().remove_card().is_some());
    assert!(!reader.detect_card().unwrap());
}
