use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, info, trace, warn};

use crate::com::Com;
use crate::config::Config;
use crate::picc::{self, Block, MifareKey, Type, Uid};
use crate::register::{
    Command, Register, ALL_IRQ, BUFFER_OVFL, COLL_ERR, CRC_IRQ, CRYPTO1_ON, ERR_IRQ,
    FLUSH_BUFFER, HI_ALERT_IRQ, IDLE_IRQ, IRQ_INV, PARITY_ERR, POWER_DOWN, PROTOCOL_ERR,
    RX_IRQ, RX_LAST_BITS, START_SEND, TIMER_IRQ, TX_RF_EN,
};
use crate::{Error, PiccReader};

/// Register reads spent waiting for a command to finish. No delay in between.
const COMMAND_POLL_BUDGET: u16 = 2000;
/// Polls of the CRC coprocessor, `CRC_POLL_INTERVAL_MS` apart.
const CRC_POLL_BUDGET: u8 = 255;
const CRC_POLL_INTERVAL_MS: u32 = 5;
/// Power-down bit checks after a soft reset.
const RESET_POLL_BUDGET: u8 = 3;
/// Largest response the engine drains from the FIFO.
const MAX_RESPONSE_LEN: usize = 16;

type DriverResult<T, C, PE> = Result<T, Error<<C as Com>::Error, PE>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    NoTag,
    Error,
}

/// Outcome of one pass through the command dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transceived {
    pub status: Status,
    pub data: Vec<u8>,
    /// Valid bits in `data`; the last byte may be partial.
    pub bits: usize,
}

impl Transceived {
    fn failed() -> Self {
        Self {
            status: Status::Error,
            data: Vec::new(),
            bits: 0,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// A 4 bit MIFARE ACK.
    fn is_ack(&self) -> bool {
        self.is_ok()
            && self.bits == 4
            && self.data.first().map_or(false, |b| b & 0x0F == picc::MF_ACK)
    }
}

/// Result registers of the CRC coprocessor. `complete` is false when the
/// poll budget ran out, in which case the bytes are whatever was left there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Crc {
    pub low: u8,
    pub high: u8,
    pub complete: bool,
}

enum Poll {
    Completed,
    TimerExpired,
    Exhausted,
}

/// MFRC522 reader driver.
///
/// Every operation is a blocking round trip and takes `&mut self`; share one
/// chip between threads behind a `Mutex`.
pub struct Mfrc522<C, RST, DELAY> {
    com: C,
    rst: RST,
    delay: DELAY,
    config: Config,
}

impl<C, RST, DELAY> Mfrc522<C, RST, DELAY> {
    /// Wraps the bus, reset line and delay. Does not touch the chip; call
    /// [`PiccReader::initialize`] before use.
    pub fn new(com: C, rst: RST, delay: DELAY, config: Config) -> Self {
        Self {
            com,
            rst,
            delay,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn com_mut(&mut self) -> &mut C {
        &mut self.com
    }

    pub fn release(self) -> (C, RST, DELAY) {
        (self.com, self.rst, self.delay)
    }
}

impl<C, RST, DELAY, PE> Mfrc522<C, RST, DELAY>
where
    C: Com,
    RST: OutputPin<Error = PE>,
    PE: Debug,
    DELAY: DelayMs<u32>,
{
    /// Content of the version register (0x91 / 0x92 for MFRC522 v1 / v2).
    pub fn version(&mut self) -> DriverResult<u8, C, PE> {
        self.read(Register::Version)
    }

    /// Turns both TX drivers on unless they already are.
    pub fn enable_antenna(&mut self) -> DriverResult<(), C, PE> {
        let control = self.read(Register::TxControl)?;
        if control & TX_RF_EN != TX_RF_EN {
            self.write(Register::TxControl, control | TX_RF_EN)?;
        }
        Ok(())
    }

    pub fn disable_antenna(&mut self) -> DriverResult<(), C, PE> {
        self.clear_bits(Register::TxControl, TX_RF_EN)
    }

    /// Puts the selected PICC into HALT. A PICC acknowledges HLTA by staying
    /// silent, so any answer at all means the halt was not taken.
    pub fn halt(&mut self) -> DriverResult<bool, C, PE> {
        let mut frame = vec![picc::Command::HltA.value(), 0x00];
        self.append_crc(&mut frame)?;
        let response = self.execute_command(Command::Transceive, &frame)?;
        Ok(response.status == Status::NoTag)
    }

    /// Reads and logs every mapped register.
    pub fn dump_registers(&mut self) -> DriverResult<Vec<(Register, u8)>, C, PE> {
        crate::util::dump_registers(&mut self.com).map_err(Error::Com)
    }

    fn read(&mut self, reg: Register) -> DriverResult<u8, C, PE> {
        self.com.read_register(reg).map_err(Error::Com)
    }

    fn write(&mut self, reg: Register, value: u8) -> DriverResult<(), C, PE> {
        self.com.write_register(reg, value).map_err(Error::Com)
    }

    fn command(&mut self, command: Command) -> DriverResult<(), C, PE> {
        self.write(Register::Command, command.value())
    }

    fn set_bits(&mut self, reg: Register, mask: u8) -> DriverResult<(), C, PE> {
        let value = self.read(reg)?;
        self.write(reg, value | mask)
    }

    fn clear_bits(&mut self, reg: Register, mask: u8) -> DriverResult<(), C, PE> {
        let value = self.read(reg)?;
        self.write(reg, value & !mask)
    }

    fn calculate_crc(&mut self, data: &[u8]) -> DriverResult<Crc, C, PE> {
        self.write(Register::DivIrq, CRC_IRQ)?;
        self.set_bits(Register::FifoLevel, FLUSH_BUFFER)?;
        self.command(Command::Idle)?;
        for &byte in data {
            self.write(Register::FifoData, byte)?;
        }
        self.command(Command::CalcCrc)?;

        let mut complete = false;
        for _ in 0..CRC_POLL_BUDGET {
            if self.read(Register::DivIrq)? & CRC_IRQ != 0 {
                complete = true;
                break;
            }
            self.delay.delay_ms(CRC_POLL_INTERVAL_MS);
        }

        let low = self.read(Register::CrcResultLow)?;
        let high = self.read(Register::CrcResultHigh)?;
        Ok(Crc {
            low,
            high,
            complete,
        })
    }

    fn append_crc(&mut self, frame: &mut Vec<u8>) -> DriverResult<(), C, PE> {
        let crc = self.calculate_crc(frame)?;
        if !crc.complete {
            warn!("CRC coprocessor did not finish, appending possibly stale CRC to {:02x?}", frame);
        }
        frame.push(crc.low);
        frame.push(crc.high);
        Ok(())
    }

    /// Loads `data` into the FIFO, runs `command` and waits for it to finish.
    ///
    /// A single attempt: the poll loop either sees the command's completion
    /// bits, the timer IRQ, or runs out of budget. Only Transceive drains the
    /// FIFO afterwards.
    pub(crate) fn execute_command(
        &mut self,
        command: Command,
        data: &[u8],
    ) -> DriverResult<Transceived, C, PE> {
        let (irq_en, wait_irq) = match command {
            Command::MfAuthent => (ERR_IRQ | IDLE_IRQ, IDLE_IRQ),
            Command::Transceive => (ALL_IRQ & !HI_ALERT_IRQ, IDLE_IRQ | RX_IRQ),
            _ => (0x00, 0x00),
        };

        self.write(Register::ComIEn, irq_en | IRQ_INV)?;
        self.write(Register::ComIrq, ALL_IRQ)?;
        self.set_bits(Register::FifoLevel, FLUSH_BUFFER)?;
        self.command(Command::Idle)?;
        for &byte in data {
            self.write(Register::FifoData, byte)?;
        }
        self.command(command)?;
        if command == Command::Transceive {
            self.set_bits(Register::BitFraming, START_SEND)?;
        }

        let mut irq = 0;
        let mut poll = Poll::Exhausted;
        for _ in 0..COMMAND_POLL_BUDGET {
            irq = self.read(Register::ComIrq)?;
            if irq & TIMER_IRQ != 0 {
                poll = Poll::TimerExpired;
                break;
            }
            if irq & wait_irq != 0 {
                poll = Poll::Completed;
                break;
            }
        }

        self.clear_bits(Register::BitFraming, START_SEND)?;

        match poll {
            Poll::Exhausted => {
                warn!("{:?} did not complete within {} polls", command, COMMAND_POLL_BUDGET);
                return Ok(Transceived::failed());
            }
            Poll::TimerExpired => trace!("{:?} hit the timer IRQ", command),
            Poll::Completed => {}
        }

        let error = self.read(Register::Error)?;
        if error & (BUFFER_OVFL | COLL_ERR | PARITY_ERR | PROTOCOL_ERR) != 0 {
            debug!("{:?} failed, error register {:#04x}", command, error);
            return Ok(Transceived::failed());
        }
        let status = if irq & irq_en & TIMER_IRQ != 0 {
            Status::NoTag
        } else {
            Status::Ok
        };

        let mut response = Transceived {
            status,
            data: Vec::new(),
            bits: 0,
        };
        if command == Command::Transceive {
            let level = self.read(Register::FifoLevel)? as usize;
            let last_bits = (self.read(Register::Control)? & RX_LAST_BITS) as usize;
            let n = level.clamp(1, MAX_RESPONSE_LEN);
            response.bits = if last_bits != 0 {
                (n - 1) * 8 + last_bits
            } else {
                n * 8
            };
            for _ in 0..n {
                let byte = self.read(Register::FifoData)?;
                response.data.push(byte);
            }
        }
        trace!(
            "{:?} -> {:?}, {} bits {:02x?}",
            command,
            response.status,
            response.bits,
            response.data
        );
        Ok(response)
    }
}

impl<C, RST, DELAY, PE> PiccReader for Mfrc522<C, RST, DELAY>
where
    C: Com,
    RST: OutputPin<Error = PE>,
    PE: Debug,
    DELAY: DelayMs<u32>,
{
    type Error = Error<C::Error, PE>;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        info!(
            "initializing MFRC522 on bus {}.{}, reset pin {}",
            self.config.bus_id, self.config.device_id, self.config.reset_pin
        );
        self.hardware_reset()?;
        self.soft_reset()?;
        debug!("MFRC522 version {:#04x}", self.version()?);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), Self::Error> {
        info!("shutting down MFRC522");
        self.command(Command::Idle)?;
        self.disable_antenna()?;
        self.rst.set_low().map_err(Error::ResetLine)
    }

    fn detect_card(&mut self) -> Result<bool, Self::Error> {
        // REQA is a short frame: 7 bits of the only byte
        self.write(Register::BitFraming, 0x07)?;
        let response =
            self.execute_command(Command::Transceive, &[picc::Command::ReqA.value()])?;
        let present = response.is_ok() && response.bits == 16;
        if present {
            debug!("card present, ATQA {:02x?}", response.data);
        }
        Ok(present)
    }

    fn resolve_uid(&mut self) -> Result<Option<Uid>, Self::Error> {
        self.write(Register::BitFraming, 0x00)?;
        let frame = [picc::Command::SelCl1.value(), picc::NVB_ANTICOLLISION];
        let response = self.execute_command(Command::Transceive, &frame)?;
        if !response.is_ok() {
            return Ok(None);
        }
        let uid = Uid::from_anticollision(&response.data);
        match uid {
            Some(uid) => debug!("resolved UID {}", uid),
            None => debug!("anti collision reply rejected: {:02x?}", response.data),
        }
        Ok(uid)
    }

    fn select_card(&mut self, uid: &Uid) -> Result<bool, Self::Error> {
        self.command(Command::Idle)?;
        let mut frame = vec![picc::Command::SelCl1.value(), picc::NVB_SELECT];
        frame.extend_from_slice(uid.as_bytes());
        frame.push(uid.bcc());
        self.append_crc(&mut frame)?;
        let response = self.execute_command(Command::Transceive, &frame)?;
        if let (true, Some(&sak)) = (response.is_ok(), response.data.first()) {
            debug!("selected {}, SAK {:#04x} ({:?})", uid, sak, Type::from_sak(sak));
        }
        Ok(response.is_ok())
    }

    fn authenticate(
        &mut self,
        sector: u8,
        key: &MifareKey,
        uid: &Uid,
    ) -> Result<bool, Self::Error> {
        let mut frame = vec![picc::Command::MfAuthKeyA.value(), sector];
        frame.extend_from_slice(key);
        frame.extend_from_slice(uid.as_bytes());
        let response = self.execute_command(Command::MfAuthent, &frame)?;
        if !response.is_ok() {
            return Ok(false);
        }
        // MFAuthent can end in Idle without the card ever answering.
        let crypto = self.read(Register::Status2)? & CRYPTO1_ON != 0;
        if !crypto {
            debug!("authentication of sector {} not accepted", sector);
        }
        Ok(crypto)
    }

    fn stop_crypto(&mut self) -> Result<(), Self::Error> {
        self.clear_bits(Register::Status2, CRYPTO1_ON)
    }

    fn read_sector(&mut self, sector: u8) -> Result<Option<Block>, Self::Error> {
        let mut frame = vec![picc::Command::MfRead.value(), sector];
        self.append_crc(&mut frame)?;
        let response = self.execute_command(Command::Transceive, &frame)?;
        if !response.is_ok() || response.data.len() != MAX_RESPONSE_LEN {
            return Ok(None);
        }
        let mut block = [0u8; 16];
        block.copy_from_slice(&response.data);
        Ok(Some(block))
    }

    fn write_sector(&mut self, sector: u8, data: &Block) -> Result<bool, Self::Error> {
        let mut frame = vec![picc::Command::MfWrite.value(), sector];
        self.append_crc(&mut frame)?;
        let response = self.execute_command(Command::Transceive, &frame)?;
        if !response.is_ack() {
            debug!("write of sector {} refused: {:02x?}", sector, response.data);
            return Ok(false);
        }

        let mut frame = data.to_vec();
        self.append_crc(&mut frame)?;
        let response = self.execute_command(Command::Transceive, &frame)?;
        if !response.is_ack() {
            debug!("data for sector {} refused: {:02x?}", sector, response.data);
        }
        Ok(response.is_ack())
    }

    fn idle(&mut self) -> Result<(), Self::Error> {
        self.command(Command::Idle)
    }

    fn soft_reset(&mut self) -> Result<(), Self::Error> {
        info!("soft reset");
        self.command(Command::SoftReset)?;
        for _ in 0..RESET_POLL_BUDGET {
            self.delay.delay_ms(self.config.settle_ms);
            if self.read(Register::Command)? & POWER_DOWN == 0 {
                break;
            }
        }

        // TAuto=1, f_timer = 13.56 MHz / (2 * 0xD3E + 1) ~ 2 kHz, reload 30 => ~15 ms timeout
        self.write(Register::TMode, 0x8D)?;
        self.write(Register::TPrescaler, 0x3E)?;
        self.write(Register::TReloadLow, 30)?;
        self.write(Register::TReloadHigh, 0)?;
        // force 100 % ASK modulation
        self.write(Register::TxAsk, 0x40)?;
        // CRC preset 0x6363 (ISO 14443-3 part 6.2.4)
        self.write(Register::Mode, 0x3D)?;
        self.enable_antenna()
    }

    fn hardware_reset(&mut self) -> Result<(), Self::Error> {
        info!("hardware reset, holding line {} low", self.config.reset_pin);
        self.rst.set_low().map_err(Error::ResetLine)?;
        self.delay.delay_ms(self.config.reset_duration_ms);
        self.rst.set_high().map_err(Error::ResetLine)
    }
}
