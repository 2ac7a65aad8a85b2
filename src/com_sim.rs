//! Simulated MFRC522 with one MIFARE Classic 1K card in its field.
//!
//! `SimChip` implements [`Com`] and models the parts of the chip the driver
//! touches: FIFO, IRQ flags with Set1 semantics, the CRC coprocessor, the
//! Transceive / MFAuthent commands and soft reset. The knobs on it inject the
//! faults a real reader runs into.

use core::convert::Infallible;
use std::collections::VecDeque;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use thiserror::Error;

use super::com::Com;
use crate::picc::{self, Block, MifareKey, Uid};
use crate::register::{
    Command, Register, COLL_ERR, CRC_IRQ, CRYPTO1_ON, ERR_IRQ, FLUSH_BUFFER, IDLE_IRQ, IRQ_SET1,
    RX_IRQ, RX_LAST_BITS, START_SEND, TIMER_IRQ, TX_RF_EN,
};

const FIFO_SIZE: usize = 64;
const BLOCKS: usize = 64;
const VERSION: u8 = 0x92;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("simulated bus failure")]
    BusFault,
}

/// ISO/IEC 14443-3 CRC_A, low byte first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut b = byte ^ (crc & 0xFF) as u8;
        b ^= b << 4;
        let b = b as u16;
        crc = (crc >> 8) ^ (b << 8) ^ (b << 3) ^ (b >> 4);
    }
    crc.to_le_bytes()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Ready,
    Active,
    Halt,
}

#[derive(Debug, Clone)]
pub struct SimCard {
    pub uid: Uid,
    pub sak: u8,
    pub key: MifareKey,
    pub blocks: [Block; BLOCKS],
    pub state: CardState,
    authenticated_sector: Option<u8>,
    pending_write: Option<u8>,
}

impl SimCard {
    pub fn new(uid: [u8; 4]) -> Self {
        Self {
            uid: Uid::new(uid),
            sak: 0x08,
            key: picc::DEFAULT_KEY,
            blocks: [[0u8; 16]; BLOCKS],
            state: CardState::Idle,
            authenticated_sector: None,
            pending_write: None,
        }
    }

    pub fn with_key(mut self, key: MifareKey) -> Self {
        self.key = key;
        self
    }

    fn leave_field(&mut self) {
        self.state = CardState::Idle;
        self.authenticated_sector = None;
        self.pending_write = None;
    }
}

pub struct SimChip {
    regs: [u8; 0x40],
    fifo: VecDeque<u8>,
    pub card: Option<SimCard>,
    /// Replaces the FIFO level the chip reports.
    pub fifo_level_override: Option<u8>,
    /// The CRC coprocessor never raises CRCIRq and leaves its result registers alone.
    pub crc_stuck: bool,
    /// Commands never raise any IRQ.
    pub hang: bool,
    /// Raises CollErr on the anti collision reply.
    pub collision: bool,
    /// Replaces the BCC byte of the anti collision reply.
    pub bcc_override: Option<u8>,
    /// ATQA sent in reply to REQA.
    pub atqa: Vec<u8>,
    /// Nibble the card answers the first write phase with.
    pub write_ack: u8,
    /// MFAuthent completes but Crypto1On never comes up.
    pub suppress_crypto: bool,
    /// Fail every bus transaction once this many have gone through.
    pub fail_after: Option<usize>,
    transactions: usize,
    /// Frames handed to the card, in order.
    pub frames: Vec<Vec<u8>>,
    /// Every register write, in order.
    pub writes: Vec<(Register, u8)>,
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimChip {
    /// A chip with no card in the field.
    pub fn new() -> Self {
        let mut chip = Self {
            regs: [0; 0x40],
            fifo: VecDeque::with_capacity(FIFO_SIZE),
            card: None,
            fifo_level_override: None,
            crc_stuck: false,
            hang: false,
            collision: false,
            bcc_override: None,
            atqa: vec![0x04, 0x00],
            write_ack: picc::MF_ACK,
            suppress_crypto: false,
            fail_after: None,
            transactions: 0,
            frames: Vec::new(),
            writes: Vec::new(),
        };
        chip.power_on_defaults();
        chip
    }

    pub fn with_card(card: SimCard) -> Self {
        let mut chip = Self::new();
        chip.card = Some(card);
        chip
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg.addr() as usize]
    }

    /// Pokes a register without going through the write side effects.
    pub fn set_register(&mut self, reg: Register, value: u8) {
        self.regs[reg.addr() as usize] = value;
    }

    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn remove_card(&mut self) -> Option<SimCard> {
        self.card.take()
    }

    fn power_on_defaults(&mut self) {
        self.regs = [0; 0x40];
        self.set_register(Register::Command, 0x20);
        self.set_register(Register::ComIEn, 0x80);
        self.set_register(Register::Control, 0x10);
        self.set_register(Register::Mode, 0x3F);
        self.set_register(Register::TxControl, 0x80);
        self.set_register(Register::Version, VERSION);
        self.fifo.clear();
    }

    fn antenna_on(&self) -> bool {
        self.register(Register::TxControl) & TX_RF_EN == TX_RF_EN
    }

    fn raise(&mut self, reg: Register, bits: u8) {
        self.regs[reg.addr() as usize] |= bits;
    }

    fn flag_write(&mut self, reg: Register, value: u8) {
        let bits = value & !IRQ_SET1;
        if value & IRQ_SET1 != 0 {
            self.raise(reg, bits);
        } else {
            self.regs[reg.addr() as usize] &= !bits;
        }
    }

    fn tick(&mut self) -> Result<(), SimError> {
        if let Some(limit) = self.fail_after {
            if self.transactions >= limit {
                return Err(SimError::BusFault);
            }
        }
        self.transactions += 1;
        Ok(())
    }

    fn start_command(&mut self, value: u8) {
        self.set_register(Register::Command, value);
        if value & 0x0F == Command::SoftReset.value() {
            self.power_on_defaults();
            self.set_register(Register::Command, Command::Idle.value());
            if let Some(card) = self.card.as_mut() {
                card.leave_field();
            }
            return;
        }
        self.set_register(Register::Error, 0);
        match value & 0x0F {
            v if v == Command::CalcCrc.value() => self.calc_crc(),
            v if v == Command::MfAuthent.value() => self.authenticate(),
            _ => {}
        }
    }

    fn calc_crc(&mut self) {
        let data: Vec<u8> = self.fifo.drain(..).collect();
        if self.crc_stuck {
            return;
        }
        let [low, high] = crc_a(&data);
        self.set_register(Register::CrcResultLow, low);
        self.set_register(Register::CrcResultHigh, high);
        self.raise(Register::DivIrq, CRC_IRQ);
    }

    fn authenticate(&mut self) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        self.frames.push(frame.clone());
        if self.hang {
            return;
        }
        let on_air = self.antenna_on();
        let accepted = match self.card.as_mut() {
            Some(card) if on_air && card.state == CardState::Active && frame.len() == 12 => {
                let key_ok = frame[0] == picc::Command::MfAuthKeyA.value()
                    && frame[2..8] == card.key
                    && frame[8..12] == card.uid.as_bytes()[..];
                if key_ok {
                    card.authenticated_sector = Some(frame[1] / 4);
                } else {
                    card.leave_field();
                }
                key_ok
            }
            _ => false,
        };
        if !accepted {
            // the card stays silent and the timer runs out
            self.raise(Register::ComIrq, TIMER_IRQ);
            return;
        }
        if !self.suppress_crypto {
            self.raise(Register::Status2, CRYPTO1_ON);
        }
        self.set_register(Register::Command, Command::Idle.value());
        self.raise(Register::ComIrq, IDLE_IRQ);
    }

    fn transceive(&mut self) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        let tx_last_bits = self.register(Register::BitFraming) & 0x07;
        self.frames.push(frame.clone());
        if self.hang {
            return;
        }
        match self.card_reply(&frame, tx_last_bits) {
            Some((reply, last_bits)) => {
                self.fifo.extend(reply);
                let control = self.register(Register::Control) & !RX_LAST_BITS;
                self.set_register(Register::Control, control | last_bits);
                self.raise(Register::ComIrq, RX_IRQ);
                if self.collision && frame.first() == Some(&picc::Command::SelCl1.value()) {
                    self.raise(Register::Error, COLL_ERR);
                    self.raise(Register::ComIrq, ERR_IRQ);
                }
            }
            None => self.raise(Register::ComIrq, TIMER_IRQ),
        }
    }

    fn card_reply(&mut self, frame: &[u8], tx_last_bits: u8) -> Option<(Vec<u8>, u8)> {
        if !self.antenna_on() {
            return None;
        }
        let crypto = self.register(Register::Status2) & CRYPTO1_ON != 0;
        let atqa = self.atqa.clone();
        let bcc_override = self.bcc_override;
        let write_ack = self.write_ack;
        let card = self.card.as_mut()?;

        if let Some(block) = card.pending_write.take() {
            if frame.len() == 18 && crc_a(&frame[..16]) == frame[16..] {
                card.blocks[block as usize].copy_from_slice(&frame[..16]);
                return Some((vec![picc::MF_ACK], 4));
            }
            return Some((vec![0x04], 4));
        }

        let authorized =
            |card: &SimCard, block: u8| crypto && card.authenticated_sector == Some(block / 4);
        let crc_ok = |frame: &[u8]| {
            frame.len() >= 3 && crc_a(&frame[..frame.len() - 2]) == frame[frame.len() - 2..]
        };

        match frame {
            [0x26] if tx_last_bits == 7 => match card.state {
                CardState::Idle => {
                    card.state = CardState::Ready;
                    Some((atqa, 0))
                }
                CardState::Halt => None,
                _ => {
                    card.leave_field();
                    None
                }
            },
            [0x93, 0x20] if card.state == CardState::Ready => {
                let mut reply = card.uid.as_bytes().to_vec();
                reply.push(bcc_override.unwrap_or_else(|| card.uid.bcc()));
                Some((reply, 0))
            }
            [0x93, 0x70, ..] if card.state == CardState::Ready && frame.len() == 9 => {
                if !crc_ok(frame) || frame[2..6] != card.uid.as_bytes()[..] {
                    return None;
                }
                card.state = CardState::Active;
                let mut reply = vec![card.sak];
                reply.extend_from_slice(&crc_a(&[card.sak]));
                Some((reply, 0))
            }
            [0x50, 0x00, _, _] if crc_ok(frame) => {
                card.state = CardState::Halt;
                None
            }
            [0x30, block, _, _] if crc_ok(frame) && (*block as usize) < BLOCKS => {
                if !authorized(&*card, *block) {
                    return Some((vec![0x04], 4));
                }
                let mut reply = card.blocks[*block as usize].to_vec();
                let crc = crc_a(&reply);
                reply.extend_from_slice(&crc);
                Some((reply, 0))
            }
            [0xA0, block, _, _] if crc_ok(frame) && (*block as usize) < BLOCKS => {
                if !authorized(&*card, *block) {
                    return Some((vec![0x04], 4));
                }
                if write_ack & 0x0F == picc::MF_ACK {
                    card.pending_write = Some(*block);
                }
                Some((vec![write_ack], 4))
            }
            _ => None,
        }
    }
}

impl Com for SimChip {
    type Error = SimError;

    fn read_register(&mut self, reg: Register) -> Result<u8, SimError> {
        self.tick()?;
        let value = match reg {
            Register::FifoData => self.fifo.pop_front().unwrap_or(0),
            Register::FifoLevel => self
                .fifo_level_override
                .unwrap_or(self.fifo.len().min(FIFO_SIZE) as u8),
            _ => self.register(reg),
        };
        Ok(value)
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), SimError> {
        self.tick()?;
        self.writes.push((reg, value));
        match reg {
            Register::FifoData => {
                if self.fifo.len() < FIFO_SIZE {
                    self.fifo.push_back(value);
                }
            }
            Register::FifoLevel => {
                if value & FLUSH_BUFFER != 0 {
                    self.fifo.clear();
                }
            }
            Register::ComIrq | Register::DivIrq => self.flag_write(reg, value),
            Register::Command => self.start_command(value),
            Register::BitFraming => {
                self.set_register(reg, value);
                let transceiving =
                    self.register(Register::Command) & 0x0F == Command::Transceive.value();
                if value & START_SEND != 0 && transceiving {
                    self.transceive();
                }
            }
            Register::TxControl => {
                self.set_register(reg, value);
                if !self.antenna_on() {
                    if let Some(card) = self.card.as_mut() {
                        card.leave_field();
                    }
                    self.regs[Register::Status2.addr() as usize] &= !CRYPTO1_ON;
                }
            }
            Register::Version => {}
            _ => self.set_register(reg, value),
        }
        Ok(())
    }
}

/// Reset line stand-in that remembers every level it was driven to.
#[derive(Debug, Default)]
pub struct SimPin {
    pub levels: Vec<bool>,
}

impl SimPin {
    pub fn is_high(&self) -> Option<bool> {
        self.levels.last().copied()
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.push(true);
        Ok(())
    }
}

/// Delay that returns immediately and adds up what it was asked to wait.
#[derive(Debug, Default)]
pub struct SimDelay {
    pub elapsed_ms: u64,
    pub calls: Vec<u32>,
}

impl DelayMs<u32> for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += u64::from(ms);
        self.calls.push(ms);
    }
}
