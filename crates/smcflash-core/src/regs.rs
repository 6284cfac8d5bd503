//! AST2050 register map and SMC control register fields
//!
//! Only the registers the flash driver touches are listed here.

// ============================================================================
// Memory map
// ============================================================================

/// Static memory controller (SMC) register base
pub const SMC_BASE: u32 = 0x1600_0000;
/// SPI control register offset within the SMC block
pub const SMC_SPI_CTRL_OFFSET: u32 = 0x0C;
/// Absolute address of the SPI control register
pub const SMC_SPI_CTRL: u32 = SMC_BASE + SMC_SPI_CTRL_OFFSET;

/// System control unit (SCU) register base
pub const SCU_BASE: u32 = 0x1E6E_2000;
/// Hardware strapping register offset within the SCU block
pub const SCU_HW_STRAPPING_OFFSET: u32 = 0x70;
/// Absolute address of the hardware strapping register
pub const SCU_HW_STRAPPING: u32 = SCU_BASE + SCU_HW_STRAPPING_OFFSET;

/// Default CE0 flash window on AST2050 boards
pub const DEFAULT_FLASH_BASE: u32 = 0x1400_0000;

// ============================================================================
// SPI control register fields
// ============================================================================

/// Mask that keeps everything except the bus mode and chip-select bits
pub const CTRL_CMD_MASK: u32 = 0xFFFF_FFF8;

/// Bus mode field (bits 0..1)
pub const CTRL_MODE_MASK: u32 = 0x03;
/// Normal read (opcode 0x03) memory-mapped mode
pub const CTRL_MODE_NORMAL_READ: u32 = 0x00;
/// Fast read memory-mapped mode
pub const CTRL_MODE_FAST_READ: u32 = 0x01;
/// Normal write memory-mapped mode
pub const CTRL_MODE_NORMAL_WRITE: u32 = 0x02;
/// User mode: bytes written to the data window go straight onto the bus
pub const CTRL_MODE_USER: u32 = 0x03;

/// Chip select driven low (asserted)
pub const CTRL_CE_LOW: u32 = 0x00;
/// Chip select driven high (released)
pub const CTRL_CE_HIGH: u32 = 0x04;

/// Fast-read dummy byte count field
pub const CTRL_DUMMY_SHIFT: u32 = 6;
/// Clock divisor code field (3 bits)
pub const CTRL_DIVISOR_SHIFT: u32 = 8;
/// Largest divisor code (fastest clock, divide by 2)
pub const CTRL_DIVISOR_MAX: u8 = 7;
/// Command opcode field used by the memory-mapped read modes
pub const CTRL_CMD_SHIFT: u32 = 16;

// ============================================================================
// SCU hardware strapping fields
// ============================================================================

/// CPU clock selection (bits 9..11)
pub const STRAP_CPU_CLK_MASK: u32 = 0x0E00;
/// CPU clock selection shift
pub const STRAP_CPU_CLK_SHIFT: u32 = 9;
/// CPU:AHB clock ratio selection (bits 12..13)
pub const STRAP_CPU_RATIO_MASK: u32 = 0x3000;
/// CPU:AHB clock ratio shift
pub const STRAP_CPU_RATIO_SHIFT: u32 = 12;

// ============================================================================
// Bus timing
// ============================================================================

/// Settle time after every control register write (microseconds)
pub const CTRL_SETTLE_US: u32 = 100;
/// Settle time after every byte pushed through the data window (microseconds)
pub const BYTE_SETTLE_US: u32 = 10;
