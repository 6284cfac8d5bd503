//! Per-bank part descriptor and sector table

use crate::chip::{find_part, ClockLimits, JedecId, PartInfo, MAX_SECTORS};
use crate::error::{Error, Result};
use crate::mmio::Mmio;
use crate::smc::{SmcController, Timing};

/// Fast-read dummy bytes assumed when the part is unknown
const DEFAULT_DUMMY_BYTES: u8 = 1;

/// One erase sector of a bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Index within the bank
    pub index: usize,
    /// Absolute start address
    pub start: u32,
    /// Size in bytes
    pub size: u32,
    /// Protected sectors are skipped by erase and refused by write
    pub protected: bool,
}

/// A flash bank: the part found at one data window and its sector table
#[derive(Debug, Clone)]
pub struct FlashBank {
    index: usize,
    base: u32,
    id: JedecId,
    part: Option<&'static PartInfo>,
    timing: Timing,
    protect: heapless::Vec<bool, MAX_SECTORS>,
}

impl FlashBank {
    /// Build a descriptor for a part that has already been identified
    pub fn new(
        index: usize,
        base: u32,
        id: JedecId,
        part: Option<&'static PartInfo>,
        timing: Timing,
    ) -> Self {
        let mut protect = heapless::Vec::new();
        let sectors = part.map_or(0, |p| p.sector_count as usize);
        // Table entries never exceed MAX_SECTORS
        let _ = protect.resize(sectors.min(MAX_SECTORS), false);
        Self {
            index,
            base,
            id,
            part,
            timing,
            protect,
        }
    }

    /// Identify the part at `base` and calibrate its clocks
    ///
    /// Reads the JEDEC ID, looks it up in the part table, derives the
    /// three divisor codes from the core clock, clears the status register
    /// block-protect bits and leaves the controller in fast-read idle.
    ///
    /// An unknown part is not an error: the bank reports size 0 and no
    /// sectors, and the status register is left alone.
    pub fn identify<M: Mmio>(ctrl: &mut SmcController<M>, base: u32, index: usize) -> Result<Self> {
        let id = ctrl.read_jedec_id(base);
        let part = find_part(id);

        match part {
            Some(p) => log::info!(
                "Bank {}: {} {} (ID {}) at 0x{:08X}, {} KiB",
                index,
                p.vendor,
                p.name,
                id,
                base,
                p.size / 1024
            ),
            None => log::warn!("Bank {}: unsupported SPI flash ID {} at 0x{:08X}", index, id, base),
        }

        let core_mhz = ctrl.core_clock_mhz();
        let limits = part.map_or(ClockLimits::DEFAULT, |p| p.clocks);
        let timing = Timing::calibrate(core_mhz, &limits);
        log::debug!(
            "Bank {}: divisor codes write {} erase {} read {} at {} MHz",
            index,
            timing.write,
            timing.erase,
            timing.read,
            core_mhz
        );

        let bank = Self::new(index, base, id, part, timing);

        let unprotect = if bank.is_present() {
            ctrl.write_status(base, timing.write, 0)
        } else {
            Ok(())
        };
        ctrl.reset(timing.read, bank.dummy_bytes());
        unprotect?;

        Ok(bank)
    }

    /// Bank number
    pub fn index(&self) -> usize {
        self.index
    }

    /// Base address of the data window
    pub fn base(&self) -> u32 {
        self.base
    }

    /// JEDEC ID read at identification
    pub fn id(&self) -> JedecId {
        self.id
    }

    /// Part table entry, `None` for an unknown part
    pub fn part(&self) -> Option<&'static PartInfo> {
        self.part
    }

    /// Divisor codes
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// True if a known part was found
    pub fn is_present(&self) -> bool {
        self.part.is_some()
    }

    /// Part name, or "unknown"
    pub fn name(&self) -> &'static str {
        self.part.map_or("unknown", |p| p.name)
    }

    /// Capacity in bytes (0 for an unknown part)
    pub fn size(&self) -> u32 {
        self.part.map_or(0, |p| p.size)
    }

    /// Number of erase sectors
    pub fn sector_count(&self) -> usize {
        self.protect.len()
    }

    /// Size of each erase sector
    pub fn sector_size(&self) -> u32 {
        self.part.map_or(0, |p| p.sector_size)
    }

    /// Fast-read dummy bytes
    pub fn dummy_bytes(&self) -> u8 {
        self.part.map_or(DEFAULT_DUMMY_BYTES, |p| p.dummy_bytes)
    }

    /// Absolute start address of a sector
    pub fn sector_start(&self, sector: usize) -> Option<u32> {
        (sector < self.sector_count()).then(|| self.base + sector as u32 * self.sector_size())
    }

    /// Sector descriptor
    pub fn sector(&self, sector: usize) -> Option<Sector> {
        Some(Sector {
            index: sector,
            start: self.sector_start(sector)?,
            size: self.sector_size(),
            protected: self.protect[sector],
        })
    }

    /// All sectors in order
    pub fn sectors(&self) -> impl Iterator<Item = Sector> + '_ {
        (0..self.sector_count()).filter_map(move |i| self.sector(i))
    }

    /// True if `addr` falls inside `[base, base + size)`
    ///
    /// A bank with no known part contains nothing.
    pub fn contains(&self, addr: u32) -> bool {
        let addr = addr as u64;
        let base = self.base as u64;
        addr >= base && addr < base + self.size() as u64
    }

    /// Sector holding an absolute address
    pub fn find_sector(&self, addr: u32) -> Option<usize> {
        if !self.contains(addr) || self.sector_size() == 0 {
            return None;
        }
        let sector = ((addr - self.base) / self.sector_size()) as usize;
        (sector < self.sector_count()).then_some(sector)
    }

    /// Protection flag of a sector (false if out of range)
    pub fn is_protected(&self, sector: usize) -> bool {
        self.protect.get(sector).copied().unwrap_or(false)
    }

    /// Set the protection flag of one sector
    pub fn set_protected(&mut self, sector: usize, protected: bool) {
        if let Some(flag) = self.protect.get_mut(sector) {
            *flag = protected;
        }
    }

    /// Number of protected sectors
    pub fn protected_count(&self) -> usize {
        self.protect.iter().filter(|&&p| p).count()
    }

    /// Set or clear protection on every sector overlapping `[start, end]`
    ///
    /// Returns the number of sectors overlapping the range.
    pub fn protect_range(&mut self, protected: bool, start: u32, end: u32) -> usize {
        let size = self.sector_size() as u64;
        let (start, end) = (start as u64, end as u64);
        let mut touched = 0;
        for i in 0..self.sector_count() {
            let s = self.base as u64 + i as u64 * size;
            let e = s + size - 1;
            if s <= end && e >= start {
                self.protect[i] = protected;
                touched += 1;
            }
        }
        touched
    }

    /// First protected sector overlapping `len` bytes at `addr`
    pub fn first_protected_in(&self, addr: u32, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let first = self.find_sector(addr)?;
        let last_addr = (addr as u64 + len as u64 - 1).min(u32::MAX as u64) as u32;
        let last = self.find_sector(last_addr).unwrap_or(self.sector_count().saturating_sub(1));
        (first..=last).find(|&s| self.is_protected(s))
    }

    /// Check that `len` bytes at `addr` lie inside the bank
    pub fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        let start = addr as u64;
        let base = self.base as u64;
        if start < base || start + len as u64 > base + self.size() as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::find_part_by_name;

    fn w25x16(base: u32) -> FlashBank {
        let part = find_part_by_name("W25X16").unwrap();
        FlashBank::new(0, base, part.id, Some(part), Timing::default())
    }

    #[test]
    fn test_sector_starts() {
        let bank = w25x16(0x1400_0000);
        assert_eq!(bank.sector_count(), 32);
        for (i, s) in bank.sectors().enumerate() {
            assert_eq!(s.start, 0x1400_0000 + i as u32 * 0x1_0000);
            assert!(!s.protected);
        }
        let last = bank.sector(31).unwrap();
        assert!(last.start + last.size <= bank.base() + bank.size());
        assert_eq!(bank.sector_start(32), None);
    }

    #[test]
    fn test_unknown_part() {
        let bank = FlashBank::new(1, 0x1400_0000, JedecId::from_word(0x123456), None, Timing::default());
        assert!(!bank.is_present());
        assert_eq!(bank.size(), 0);
        assert_eq!(bank.sector_count(), 0);
        assert!(!bank.contains(0x1400_0000));
        assert_eq!(bank.check_range(0x1400_0000, 1), Err(Error::AddressOutOfBounds));
        assert_eq!(bank.check_range(0x1400_0000, 0), Ok(()));
    }

    #[test]
    fn test_find_sector() {
        let bank = w25x16(0);
        assert_eq!(bank.find_sector(0), Some(0));
        assert_eq!(bank.find_sector(0xFFFF), Some(0));
        assert_eq!(bank.find_sector(0x1_0000), Some(1));
        assert_eq!(bank.find_sector(0x1F_FFFF), Some(31));
        assert_eq!(bank.find_sector(0x20_0000), None);
    }

    #[test]
    fn test_protect_range_overlap() {
        let mut bank = w25x16(0);
        // Touches the last byte of sector 1 through the first byte of sector 3
        assert_eq!(bank.protect_range(true, 0x1_FFFF, 0x3_0000), 3);
        let protected: heapless::Vec<usize, 32> =
            bank.sectors().filter(|s| s.protected).map(|s| s.index).collect();
        assert_eq!(protected.as_slice(), &[1, 2, 3]);
        assert_eq!(bank.protected_count(), 3);

        assert_eq!(bank.protect_range(false, 0x2_0000, 0x2_0000), 1);
        assert!(!bank.is_protected(2));
        assert!(bank.is_protected(1));
    }

    #[test]
    fn test_first_protected_in() {
        let mut bank = w25x16(0);
        bank.set_protected(5, true);
        assert_eq!(bank.first_protected_in(0x4_0000, 0x1_0000), None);
        assert_eq!(bank.first_protected_in(0x4_FFFF, 2), Some(5));
        assert_eq!(bank.first_protected_in(0, 0x20_0000), Some(5));
        assert_eq!(bank.first_protected_in(0x5_0000, 0), None);
    }

    #[test]
    fn test_check_range() {
        let bank = w25x16(0x1400_0000);
        assert_eq!(bank.check_range(0x1400_0000, 0x20_0000), Ok(()));
        assert_eq!(bank.check_range(0x1400_0001, 0x20_0000), Err(Error::AddressOutOfBounds));
        assert_eq!(bank.check_range(0x13FF_FFFF, 1), Err(Error::AddressOutOfBounds));
    }
}
