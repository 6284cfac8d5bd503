//! Flash part type definitions

use core::fmt;

/// 24-bit JEDEC identification as returned by the RDID (0x9F) command
///
/// The three ID bytes arrive on the bus as manufacturer, memory type and
/// capacity. The controller's data window hands them back as one
/// little-endian word, so the manufacturer ends up in the low byte:
/// a Winbond W25X16 (`EF 30 15`) reads as `0x1530EF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JedecId(u32);

impl JedecId {
    /// Build an ID from the raw little-endian data window word
    ///
    /// Only the low 24 bits are kept.
    pub const fn from_word(word: u32) -> Self {
        Self(word & 0x00FF_FFFF)
    }

    /// Build an ID from the three bytes in bus order
    pub const fn from_bytes(manufacturer: u8, memory_type: u8, capacity: u8) -> Self {
        Self((manufacturer as u32) | ((memory_type as u32) << 8) | ((capacity as u32) << 16))
    }

    /// The raw 24-bit value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// JEDEC manufacturer ID (first byte on the bus)
    pub const fn manufacturer(&self) -> u8 {
        self.0 as u8
    }

    /// Memory type (second byte on the bus)
    pub const fn memory_type(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Capacity code (third byte on the bus)
    pub const fn capacity(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// The three ID bytes in bus order
    pub const fn to_bytes(&self) -> [u8; 3] {
        [self.manufacturer(), self.memory_type(), self.capacity()]
    }
}

impl fmt::Display for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

/// Maximum SPI clock, in MHz, for each class of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockLimits {
    /// Write enable, status write and page program
    pub write_mhz: u32,
    /// Sector erase
    pub erase_mhz: u32,
    /// Memory-mapped fast read
    pub read_mhz: u32,
}

impl ClockLimits {
    /// Create a new set of clock ceilings
    pub const fn new(write_mhz: u32, erase_mhz: u32, read_mhz: u32) -> Self {
        Self {
            write_mhz,
            erase_mhz,
            read_mhz,
        }
    }
}

/// Static description of a supported SPI NOR part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartInfo {
    /// JEDEC ID as read through the data window
    pub id: JedecId,
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Part name (e.g., "W25X16")
    pub name: &'static str,
    /// Total capacity in bytes
    pub size: u32,
    /// Number of uniform erase sectors
    pub sector_count: u32,
    /// Size of each erase sector in bytes
    pub sector_size: u32,
    /// Dummy bytes the part needs after a fast-read address
    pub dummy_bytes: u8,
    /// Clock ceilings per operation class
    pub clocks: ClockLimits,
}

impl PartInfo {
    /// Bytes covered by the sector table
    pub const fn sectors_size(&self) -> u32 {
        self.sector_count * self.sector_size
    }
}
