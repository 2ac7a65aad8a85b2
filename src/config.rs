//! Reader configuration.
//!
//! The driver never opens the bus itself; `bus_id`/`device_id` identify the
//! endpoint for the host code that does.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESET_PIN: u8 = 22;
pub const DEFAULT_RESET_DURATION_MS: u32 = 250;
pub const DEFAULT_SETTLE_MS: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// Identifier of the output wired to the chip's NRSTPD line.
    pub reset_pin: u8,
    /// How long the reset line is held low.
    pub reset_duration_ms: u32,
    /// Wait after the soft reset command before polling the power-down bit.
    pub settle_ms: u32,
    pub bus_id: u8,
    pub device_id: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_pin: DEFAULT_RESET_PIN,
            reset_duration_ms: DEFAULT_RESET_DURATION_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            bus_id: 0,
            device_id: 0,
        }
    }
}

impl Config {
    pub fn with_reset_pin(mut self, pin: u8) -> Self {
        self.reset_pin = pin;
        self
    }

    pub fn with_reset_duration_ms(mut self, ms: u32) -> Self {
        self.reset_duration_ms = ms;
        self
    }

    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn with_bus(mut self, bus_id: u8, device_id: u8) -> Self {
        self.bus_id = bus_id;
        self.device_id = device_id;
        self
    }

    /// Linux spidev node for this bus/device pair.
    pub fn spidev_path(&self) -> String {
        format!("/dev/spidev{}.{}", self.bus_id, self.device_id)
    }
}
