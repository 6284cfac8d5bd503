//! SPI control register word
//!
//! The SMC has a single SPI control register that multiplexes the bus
//! mode, the chip-select level, the clock divisor code and, for the
//! memory-mapped read modes, the read opcode and dummy byte count. A fresh
//! word is computed before every bus transition.

use core::fmt;

use crate::opcodes;
use crate::regs::*;

/// Bus mode field (bits 0..1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusMode {
    /// Memory-mapped normal read
    NormalRead,
    /// Memory-mapped fast read
    FastRead,
    /// Memory-mapped normal write
    NormalWrite,
    /// User mode: the data window talks to the bus directly
    User,
}

impl BusMode {
    /// Register encoding
    pub const fn bits(self) -> u32 {
        match self {
            Self::NormalRead => CTRL_MODE_NORMAL_READ,
            Self::FastRead => CTRL_MODE_FAST_READ,
            Self::NormalWrite => CTRL_MODE_NORMAL_WRITE,
            Self::User => CTRL_MODE_USER,
        }
    }

    /// Decode the mode field of a register value
    pub const fn from_bits(word: u32) -> Self {
        match word & CTRL_MODE_MASK {
            CTRL_MODE_NORMAL_READ => Self::NormalRead,
            CTRL_MODE_FAST_READ => Self::FastRead,
            CTRL_MODE_NORMAL_WRITE => Self::NormalWrite,
            _ => Self::User,
        }
    }
}

/// Chip-select level (bit 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipSelect {
    /// Driven low: part selected
    Low,
    /// Driven high: part released
    High,
}

impl ChipSelect {
    /// Register encoding
    pub const fn bits(self) -> u32 {
        match self {
            Self::Low => CTRL_CE_LOW,
            Self::High => CTRL_CE_HIGH,
        }
    }
}

/// A value for the SPI control register
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ControlWord(u32);

impl ControlWord {
    /// User mode word: `(divisor << 8) | chip_select | USER`
    pub const fn user(divisor: u8, cs: ChipSelect) -> Self {
        Self(((divisor as u32 & 0x7) << CTRL_DIVISOR_SHIFT) | cs.bits() | CTRL_MODE_USER)
    }

    /// Idle word the controller is left in between operations
    ///
    /// Fast read mode with chip select released, so the flash is mapped
    /// linearly into the data window.
    pub const fn fast_read_idle(divisor: u8, dummy_bytes: u8) -> Self {
        Self(
            ((opcodes::FAST_READ as u32) << CTRL_CMD_SHIFT)
                | ((divisor as u32 & 0x7) << CTRL_DIVISOR_SHIFT)
                | ((dummy_bytes as u32 & 0x3) << CTRL_DUMMY_SHIFT)
                | CTRL_CE_HIGH
                | CTRL_MODE_FAST_READ,
        )
    }

    /// Keep the upper fields of `current` and replace mode and chip select
    pub const fn modify(current: u32, mode: BusMode, cs: ChipSelect) -> Self {
        Self((current & CTRL_CMD_MASK) | cs.bits() | mode.bits())
    }

    /// Raw register value
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Wrap a raw register value
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Bus mode field
    pub const fn mode(&self) -> BusMode {
        BusMode::from_bits(self.0)
    }

    /// Chip-select field
    pub const fn chip_select(&self) -> ChipSelect {
        if self.0 & CTRL_CE_HIGH != 0 {
            ChipSelect::High
        } else {
            ChipSelect::Low
        }
    }

    /// Clock divisor code field
    pub const fn divisor(&self) -> u8 {
        ((self.0 >> CTRL_DIVISOR_SHIFT) & 0x7) as u8
    }
}

impl fmt::Debug for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlWord")
            .field("raw", &format_args!("{:#010x}", self.0))
            .field("mode", &self.mode())
            .field("cs", &self.chip_select())
            .field("divisor", &self.divisor())
            .finish()
    }
}
