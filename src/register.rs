//! MFRC522 register map and PCD command set.

use core::convert::TryFrom;
use thiserror::Error;

/// Address outside the MFRC522 register map.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid register address {0:#04x}")]
pub struct InvalidRegister(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    // Page 0: command and status
    Command = 0x01,
    ComIEn = 0x02,
    DivIEn = 0x03,
    ComIrq = 0x04,
    DivIrq = 0x05,
    Error = 0x06,
    Status1 = 0x07,
    Status2 = 0x08,
    FifoData = 0x09,
    FifoLevel = 0x0A,
    WaterLevel = 0x0B,
    Control = 0x0C,
    BitFraming = 0x0D,
    Coll = 0x0E,
    // Page 1: command
    Mode = 0x11,
    TxMode = 0x12,
    RxMode = 0x13,
    TxControl = 0x14,
    TxAsk = 0x15,
    TxSel = 0x16,
    RxSel = 0x17,
    RxThreshold = 0x18,
    Demod = 0x19,
    MfTx = 0x1C,
    MfRx = 0x1D,
    SerialSpeed = 0x1F,
    // Page 2: configuration
    CrcResultHigh = 0x21,
    CrcResultLow = 0x22,
    ModWidth = 0x24,
    RfCfg = 0x26,
    GsN = 0x27,
    CwGsP = 0x28,
    ModGsP = 0x29,
    TMode = 0x2A,
    TPrescaler = 0x2B,
    TReloadHigh = 0x2C,
    TReloadLow = 0x2D,
    TCounterValHigh = 0x2E,
    TCounterValLow = 0x2F,
    // Page 3: test
    TestSel1 = 0x31,
    TestSel2 = 0x32,
    TestPinEn = 0x33,
    TestPinValue = 0x34,
    TestBus = 0x35,
    AutoTest = 0x36,
    Version = 0x37,
    AnalogTest = 0x38,
    TestDac1 = 0x39,
    TestDac2 = 0x3A,
    TestAdc = 0x3B,
}

impl Register {
    /// Every mapped register, in address order.
    pub const ALL: [Register; 50] = [
        Register::Command,
        Register::ComIEn,
        Register::DivIEn,
        Register::ComIrq,
        Register::DivIrq,
        Register::Error,
        Register::Status1,
        Register::Status2,
        Register::FifoData,
        Register::FifoLevel,
        Register::WaterLevel,
        Register::Control,
        Register::BitFraming,
        Register::Coll,
        Register::Mode,
        Register::TxMode,
        Register::RxMode,
        Register::TxControl,
        Register::TxAsk,
        Register::TxSel,
        Register::RxSel,
        Register::RxThreshold,
        Register::Demod,
        Register::MfTx,
        Register::MfRx,
        Register::SerialSpeed,
        Register::CrcResultHigh,
        Register::CrcResultLow,
        Register::ModWidth,
        Register::RfCfg,
        Register::GsN,
        Register::CwGsP,
        Register::ModGsP,
        Register::TMode,
        Register::TPrescaler,
        Register::TReloadHigh,
        Register::TReloadLow,
        Register::TCounterValHigh,
        Register::TCounterValLow,
        Register::TestSel1,
        Register::TestSel2,
        Register::TestPinEn,
        Register::TestPinValue,
        Register::TestBus,
        Register::AutoTest,
        Register::Version,
        Register::AnalogTest,
        Register::TestDac1,
        Register::TestDac2,
        Register::TestAdc,
    ];

    pub fn addr(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Register {
    type Error = InvalidRegister;

    fn try_from(addr: u8) -> Result<Self, InvalidRegister> {
        Register::ALL
            .iter()
            .copied()
            .find(|reg| reg.addr() == addr)
            .ok_or(InvalidRegister(addr))
    }
}

/// Commands understood by the PCD's command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Idle = 0b0000,
    CalcCrc = 0b0011,
    Transmit = 0b0100,
    Receive = 0b1000,
    Transceive = 0b1100,
    MfAuthent = 0b1110,
    SoftReset = 0b1111,
}

impl Command {
    pub fn value(self) -> u8 {
        self as u8
    }
}

// CommandReg
pub(crate) const POWER_DOWN: u8 = 1 << 4;

// ComIEnReg / ComIrqReg
pub(crate) const IRQ_INV: u8 = 1 << 7;
pub(crate) const IRQ_SET1: u8 = 1 << 7;
pub(crate) const TIMER_IRQ: u8 = 1 << 0;
pub(crate) const ERR_IRQ: u8 = 1 << 1;
pub(crate) const HI_ALERT_IRQ: u8 = 1 << 3;
pub(crate) const IDLE_IRQ: u8 = 1 << 4;
pub(crate) const RX_IRQ: u8 = 1 << 5;
pub(crate) const ALL_IRQ: u8 = 0x7F;

// DivIrqReg
pub(crate) const CRC_IRQ: u8 = 1 << 2;

// ErrorReg
pub(crate) const PROTOCOL_ERR: u8 = 1 << 0;
pub(crate) const PARITY_ERR: u8 = 1 << 1;
pub(crate) const COLL_ERR: u8 = 1 << 3;
pub(crate) const BUFFER_OVFL: u8 = 1 << 4;

// Status2Reg
pub(crate) const CRYPTO1_ON: u8 = 1 << 3;

// FIFOLevelReg
pub(crate) const FLUSH_BUFFER: u8 = 1 << 7;

// ControlReg
pub(crate) const RX_LAST_BITS: u8 = 0b111;

// BitFramingReg
pub(crate) const START_SEND: u8 = 1 << 7;

// TxControlReg
pub(crate) const TX_RF_EN: u8 = 0b11;
