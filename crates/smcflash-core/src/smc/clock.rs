//! Core clock decoding and SPI clock divisor calibration
//!
//! The SPI clock is the CPU clock divided by `2 + 2 * (7 - code)` for a
//! 3-bit divisor code, so code 7 divides by 2 and code 0 divides by 16.

use crate::chip::ClockLimits;
use crate::regs::*;

/// Base CPU clock in MHz for each value of the strap selection field
const CPU_CLOCKS_MHZ: [u32; 8] = [266, 233, 200, 166, 133, 100, 300, 24];

/// Decode the effective core clock (MHz) from the SCU hardware strapping register
pub const fn core_clock_mhz(strap: u32) -> u32 {
    let base = CPU_CLOCKS_MHZ[((strap & STRAP_CPU_CLK_MASK) >> STRAP_CPU_CLK_SHIFT) as usize];
    match (strap & STRAP_CPU_RATIO_MASK) >> STRAP_CPU_RATIO_SHIFT {
        1 => base / 2,
        2 => base / 4,
        3 => base / 3,
        _ => base,
    }
}

/// Divisor for a given code
pub const fn divisor_for_code(code: u8) -> u32 {
    2 + 2 * (CTRL_DIVISOR_MAX - code) as u32
}

/// SPI clock (MHz, truncated) produced by a divisor code
pub const fn spi_clock_mhz(core_mhz: u32, code: u8) -> u32 {
    core_mhz / divisor_for_code(code)
}

/// Pick the divisor code for a frequency ceiling
///
/// Starting from the fastest step (code 7, divide by 2), walk down one
/// step at a time while the resulting clock still exceeds `ceiling_mhz`.
/// The result is the fastest step that respects the ceiling. If even the
/// slowest step is too fast the code saturates at 0.
pub const fn divisor_code(core_mhz: u32, ceiling_mhz: u32) -> u8 {
    let mut code = CTRL_DIVISOR_MAX;
    let mut div = 2;
    while core_mhz / div > ceiling_mhz {
        if code == 0 {
            break;
        }
        code -= 1;
        div += 2;
    }
    code
}

/// Divisor codes for each operation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timing {
    /// Write enable, status write and page program
    pub write: u8,
    /// Sector erase
    pub erase: u8,
    /// Memory-mapped fast read
    pub read: u8,
}

impl Timing {
    /// Calibrate all three codes for a part at the given core clock
    pub const fn calibrate(core_mhz: u32, limits: &ClockLimits) -> Self {
        Self {
            write: divisor_code(core_mhz, limits.write_mhz),
            erase: divisor_code(core_mhz, limits.erase_mhz),
            read: divisor_code(core_mhz, limits.read_mhz),
        }
    }
}

impl ClockLimits {
    /// Ceilings assumed for a part missing from the table
    pub const DEFAULT: Self = Self::new(40, 20, 40);
}
