use rc522::com_sim::{SimChip, SimDelay, SimError, SimPin};
use rc522::{Config, Error, Mfrc522, PiccReader, Register};

use crate::common::*;

#[test]
fn initialize_pulses_reset_then_configures_chip() {
    init_logger();
    let config = Config::default().with_reset_duration_ms(100);
    let mut reader = Mfrc522::new(SimChip::new(), SimPin::default(), SimDelay::default(), config);

    reader.initialize().unwrap();

    assert_eq!(reader.config().reset_duration_ms, 100);
    assert_eq!(reader.version().unwrap(), 0x92);
    let (chip, pin, delay) = reader.release();
    assert_eq!(pin.levels, vec![false, true]);
    assert_eq!(delay.calls, vec![100, 25]);
    assert_eq!(chip.register(Register::TMode), 0x8D);
    assert_eq!(chip.register(Register::TxControl) & 0x03, 0x03);
}

#[test]
fn hardware_reset_uses_default_duration() {
    let mut reader = Mfrc522::new(
        SimChip::new(),
        SimPin::default(),
        SimDelay::default(),
        Config::default(),
    );

    reader.hardware_reset().unwrap();

    let (_, pin, delay) = reader.release();
    assert_eq!(pin.levels, vec![false, true]);
    assert_eq!(delay.elapsed_ms, 250);
}

#[test]
fn shutdown_turns_off_field_and_holds_reset() {
    let mut reader = reader_with_card();
    reader.shutdown().unwrap();

    assert!(!reader.detect_card().unwrap());
    let (chip, pin, _) = reader.release();
    assert_eq!(chip.register(Register::TxControl) & 0x03, 0);
    assert_eq!(pin.is_high(), Some(false));
}

#[test]
fn soft_reset_restores_antenna_after_shutdown() {
    let mut reader = reader_with_card();
    reader.shutdown().unwrap();
    reader.hardware_reset().unwrap();
    reader.soft_reset().unwrap();

    assert!(reader.detect_card().unwrap());
}

#[test]
fn idle_cancels_current_command() {
    let mut reader = reader_with_card();
    reader.com_mut().writes.clear();

    reader.idle().unwrap();

    assert_eq!(reader.com_mut().writes, vec![(Register::Command, 0x00)]);
}

#[test]
fn transport_failure_is_a_hard_error() {
    let mut reader = reader_with_card();
    let done = reader.com_mut().transactions();
    reader.com_mut().fail_after = Some(done);

    match reader.detect_card() {
        Err(Error::Com(SimError::BusFault)) => {}
        other => panic!("expected bus fault, got {:?}", other),
    }
}

#[test]
fn stuck_crc_coprocessor_is_not_an_error() {
    let mut reader = reader_with_card();
    assert!(reader.detect_card().unwrap());
    let uid = reader.resolve_uid().unwrap().unwrap();
    reader.com_mut().crc_stuck = true;

    // the stale CRC goes out and the card ignores the frame
    assert!(!reader.select_card(&uid).unwrap());
}

#[test]
fn register_dump_covers_the_map() {
    let mut reader = reader_with_card();
    let dump = reader.dump_registers().unwrap();

    assert!(dump.contains(&(Register::Mode, 0x3D)));
    assert!(dump.iter().all(|(reg, _)| *reg != Register::FifoData));
}
