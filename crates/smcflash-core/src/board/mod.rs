//! Board configuration
//!
//! Describes where the flash banks live in the physical address space and
//! which regions must be write-protected after initialization (the boot
//! monitor itself and the persisted environment).

#[cfg(feature = "std")]
mod toml;

#[cfg(feature = "std")]
pub use self::toml::BoardConfigError;

use crate::regs::DEFAULT_FLASH_BASE;

/// Maximum number of flash banks on a board
pub const MAX_BANKS: usize = 2;

/// A contiguous address range given as start and length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// First address
    pub start: u32,
    /// Length in bytes
    pub length: u32,
}

impl Region {
    /// Create a new region
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Last address of the region (inclusive)
    ///
    /// Only meaningful for non-empty regions.
    pub const fn end(&self) -> u32 {
        self.start.wrapping_add(self.length).wrapping_sub(1)
    }

    /// True if the region covers no bytes
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Flash layout and protection of a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Base address of each bank's data window
    pub banks: heapless::Vec<u32, MAX_BANKS>,
    /// Boot monitor image, protected at init
    pub monitor: Option<Region>,
    /// Environment sector, protected at init
    pub env: Option<Region>,
    /// Redundant environment sector, protected at init
    pub env_redundant: Option<Region>,
    /// Status poll iteration cap, `None` polls forever
    pub poll_limit: Option<u32>,
}

impl BoardConfig {
    /// A board with a single bank at `base` and nothing protected
    pub fn single_bank(base: u32) -> Self {
        let mut banks = heapless::Vec::new();
        // Capacity is at least one
        let _ = banks.push(base);
        Self {
            banks,
            monitor: None,
            env: None,
            env_redundant: None,
            poll_limit: None,
        }
    }

    /// Non-empty regions to protect at init, with a label for logging
    pub fn protected_regions(&self) -> impl Iterator<Item = (&'static str, Region)> + '_ {
        [
            ("monitor", self.monitor),
            ("environment", self.env),
            ("redundant environment", self.env_redundant),
        ]
        .into_iter()
        .filter_map(|(name, region)| region.filter(|r| !r.is_empty()).map(|r| (name, r)))
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::single_bank(DEFAULT_FLASH_BASE)
    }
}
