//! Table of SPI NOR parts the driver knows how to calibrate
//!
//! Supporting a new part is a matter of adding an entry here.

use super::types::{ClockLimits, JedecId, PartInfo};

const SECTOR_64K: u32 = 0x1_0000;
const SECTOR_256K: u32 = 0x4_0000;

/// All known parts, keyed by JEDEC ID
pub static PARTS: &[PartInfo] = &[
    PartInfo {
        id: JedecId::from_word(0x17_2020),
        vendor: "ST",
        name: "M25P64",
        size: 0x80_0000,
        sector_count: 128,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(40, 20, 40),
    },
    PartInfo {
        id: JedecId::from_word(0x18_2020),
        vendor: "ST",
        name: "M25P128",
        size: 0x100_0000,
        sector_count: 64,
        sector_size: SECTOR_256K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 20, 50),
    },
    PartInfo {
        id: JedecId::from_word(0x18_2001),
        vendor: "Spansion",
        name: "S25FL128P",
        size: 0x100_0000,
        sector_count: 256,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(100, 40, 100),
    },
    PartInfo {
        id: JedecId::from_word(0x16_0201),
        vendor: "Spansion",
        name: "S25FL064A",
        size: 0x80_0000,
        sector_count: 128,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 25, 50),
    },
    PartInfo {
        id: JedecId::from_word(0x15_30ef),
        vendor: "Winbond",
        name: "W25X16",
        size: 0x20_0000,
        sector_count: 32,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 25, 50),
    },
    PartInfo {
        id: JedecId::from_word(0x16_30ef),
        vendor: "Winbond",
        name: "W25X32",
        size: 0x40_0000,
        sector_count: 64,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 25, 50),
    },
    PartInfo {
        id: JedecId::from_word(0x17_30ef),
        vendor: "Winbond",
        name: "W25X64",
        size: 0x80_0000,
        sector_count: 128,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 25, 50),
    },
    PartInfo {
        id: JedecId::from_word(0x18_20c2),
        vendor: "Macronix",
        name: "MX25L12805D",
        size: 0x100_0000,
        sector_count: 256,
        sector_size: SECTOR_64K,
        dummy_bytes: 1,
        clocks: ClockLimits::new(50, 33, 50),
    },
];

/// Largest sector count of any part in [`PARTS`]
pub const MAX_SECTORS: usize = 256;

/// Look up a part by JEDEC ID
pub fn find_part(id: JedecId) -> Option<&'static PartInfo> {
    PARTS.iter().find(|p| p.id == id)
}

/// Look up a part by name (case-insensitive)
pub fn find_part_by_name(name: &str) -> Option<&'static PartInfo> {
    PARTS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
