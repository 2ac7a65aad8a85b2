use core::fmt;

/// MIFARE Classic sector key (key A).
pub type MifareKey = [u8; 6];

/// One 16 byte MIFARE Classic block.
pub type Block = [u8; 16];

pub const DEFAULT_KEY: MifareKey = [0xFF; 6];

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReqA = 0x26,   // REQuest Type A, sent as a 7 bit short frame
    SelCl1 = 0x93, // Anti collision/Select, Cascade Level 1
    HltA = 0x50,   // HaLT Type A, the PICC goes silent until the next WUPA
    // MIFARE Classic, see MF1S503x section 9
    MfAuthKeyA = 0x60, // Authenticate a sector with key A
    MfRead = 0x30,     // Read one 16 byte block
    MfWrite = 0xA0,    // Write one 16 byte block, two-phase
}

impl Command {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// NVB for an anti collision frame with no known UID bits: SEL + NVB only.
pub const NVB_ANTICOLLISION: u8 = 0x20;
/// NVB for a full SELECT frame: seven whole bytes.
pub const NVB_SELECT: u8 = 0x70;
/// Low nibble of a MIFARE acknowledge (4 bit response).
pub const MF_ACK: u8 = 0x0A;

/// Block Check Character over the 4 UID bytes. Anything past the fourth byte is ignored.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().take(4).fold(0, |bcc, b| bcc ^ b)
}

/// Single size (4 byte) UID of a PICC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid {
    bytes: [u8; 4],
}

impl Uid {
    pub fn new(bytes: [u8; 4]) -> Self {
        Self { bytes }
    }

    /// Parses the 5 byte anti collision reply (UID + BCC). Returns `None` when the
    /// length is wrong or the BCC does not match.
    pub fn from_anticollision(response: &[u8]) -> Option<Self> {
        if response.len() != 5 {
            return None;
        }
        if response[4] != checksum(&response[..4]) {
            return None;
        }
        Some(Self::new([response[0], response[1], response[2], response[3]]))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.bytes
    }

    pub fn bcc(&self) -> u8 {
        checksum(&self.bytes)
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.bytes)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.bytes;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Unknown,
    Iso14443_4,    // PICC compliant with ISO/IEC 14443-4
    Iso18092,      // PICC compliant with ISO/IEC 18092 (NFC)
    MifareMini,    // MIFARE Classic protocol, 320 bytes
    Mifare1k,      // MIFARE Classic protocol, 1KB
    Mifare4k,      // MIFARE Classic protocol, 4KB
    MifareUL,      // MIFARE Ultralight or Ultralight C
    MifarePlus,    // MIFARE Plus
    TNP3XXX,       // Only mentioned in NXP AN 10833 MIFARE Type Identification Procedure
    NotComplete,   // SAK indicates UID is not complete.
}

impl Type {
    /// Decodes the SAK byte (NXP AN10833, 3.2). Bit 8 is ignored.
    pub fn from_sak(sak: u8) -> Self {
        match sak & 0x7F {
            0x04 => Type::NotComplete,
            0x09 => Type::MifareMini,
            0x08 => Type::Mifare1k,
            0x18 => Type::Mifare4k,
            0x00 => Type::MifareUL,
            0x10 | 0x11 => Type::MifarePlus,
            0x01 => Type::TNP3XXX,
            0x20 => Type::Iso14443_4,
            0x40 => Type::Iso18092,
            _ => Type::Unknown,
        }
    }

    pub fn is_mifare_classic(self) -> bool {
        matches!(self, Type::MifareMini | Type::Mifare1k | Type::Mifare4k)
    }
}
