//! Board-level flash: all banks behind one controller

use core::fmt;

use crate::board::{BoardConfig, MAX_BANKS};
use crate::error::{Error, Result};
use crate::mmio::Mmio;
use crate::smc::{PollLimit, SmcController};

use super::bank::FlashBank;
use super::mapped::read_buff;
use super::ops::{flash_erase, write_buff_with_progress, EraseReport};
use super::progress::FlashProgress;

/// The flash banks of a board and the controller that drives them
pub struct FlashBanks<M: Mmio> {
    ctrl: SmcController<M>,
    banks: heapless::Vec<FlashBank, MAX_BANKS>,
}

impl<M: Mmio> FlashBanks<M> {
    /// Identify every configured bank and apply the board's protection
    ///
    /// Unknown parts leave a zero-size bank behind and are only warned
    /// about. The monitor and environment regions are protected in
    /// whichever bank contains their start address.
    pub fn init(mut ctrl: SmcController<M>, config: &BoardConfig) -> Result<Self> {
        if let Some(limit) = config.poll_limit {
            ctrl.set_poll_limit(PollLimit::Iterations(limit));
        }

        let mut banks = heapless::Vec::new();
        for (index, &base) in config.banks.iter().enumerate() {
            let bank = FlashBank::identify(&mut ctrl, base, index)?;
            // config.banks has the same capacity
            let _ = banks.push(bank);
        }

        let mut flash = Self { ctrl, banks };

        for (name, region) in config.protected_regions() {
            match flash.banks.iter_mut().find(|b| b.contains(region.start)) {
                Some(bank) => {
                    let n = bank.protect_range(true, region.start, region.end());
                    log::debug!(
                        "Protected {} (0x{:08X}..=0x{:08X}): {} sectors in bank {}",
                        name,
                        region.start,
                        region.end(),
                        n,
                        bank.index()
                    );
                }
                None => log::warn!("No flash bank holds the {} at 0x{:08X}", name, region.start),
            }
        }

        log::info!("Flash: {} KiB", flash.total_size() / 1024);

        Ok(flash)
    }

    /// Sum of all bank sizes
    pub fn total_size(&self) -> u64 {
        self.banks.iter().map(|b| b.size() as u64).sum()
    }

    /// All banks in configuration order
    pub fn banks(&self) -> &[FlashBank] {
        &self.banks
    }

    /// One bank by index
    pub fn bank(&self, index: usize) -> Option<&FlashBank> {
        self.banks.get(index)
    }

    /// Bank whose address range contains `addr`
    pub fn find_bank(&self, addr: u32) -> Option<&FlashBank> {
        self.banks.iter().find(|b| b.contains(addr))
    }

    /// Set or clear protection for every sector overlapping `[start, end]`
    ///
    /// Returns the number of sectors touched across all banks.
    pub fn protect(&mut self, protected: bool, start: u32, end: u32) -> Result<usize> {
        if end < start {
            return Err(Error::AddressOutOfBounds);
        }
        let touched: usize = self
            .banks
            .iter_mut()
            .map(|b| b.protect_range(protected, start, end))
            .sum();
        if touched == 0 {
            return Err(Error::NoBankAtAddress { addr: start });
        }
        log::info!(
            "{} {} sectors",
            if protected { "Protected" } else { "Unprotected" },
            touched
        );
        Ok(touched)
    }

    /// Erase sectors `first..=last` of one bank
    ///
    /// A bank whose part was not recognized reports [`Error::UnknownPart`].
    pub fn erase<P: FlashProgress>(
        &mut self,
        bank: usize,
        first: i32,
        last: i32,
        progress: &mut P,
    ) -> Result<EraseReport> {
        let bank = self.banks.get(bank).ok_or(Error::BankNotPresent)?;
        if !bank.is_present() {
            return Err(Error::UnknownPart { id: bank.id().raw() });
        }
        flash_erase(&mut self.ctrl, bank, first, last, progress)
    }

    /// Program `data` at absolute address `addr`
    ///
    /// The range must fit in one bank and must not touch a protected
    /// sector.
    pub fn write<P: FlashProgress>(&mut self, addr: u32, data: &[u8], progress: &mut P) -> Result<()> {
        let bank = self
            .banks
            .iter()
            .find(|b| b.contains(addr))
            .ok_or(Error::NoBankAtAddress { addr })?;
        bank.check_range(addr, data.len())?;
        if let Some(sector) = bank.first_protected_in(addr, data.len()) {
            return Err(Error::RegionProtected { sector });
        }
        write_buff_with_progress(&mut self.ctrl, bank, data, addr, progress)
    }

    /// Read into `dest` from absolute address `addr`
    pub fn read(&mut self, addr: u32, dest: &mut [u8]) -> Result<()> {
        let bank = self
            .banks
            .iter()
            .find(|b| b.contains(addr))
            .ok_or(Error::NoBankAtAddress { addr })?;
        read_buff(&mut self.ctrl, bank, addr, dest)
    }

    /// The controller
    pub fn controller_mut(&mut self) -> &mut SmcController<M> {
        &mut self.ctrl
    }

    /// Give back the controller
    pub fn into_controller(self) -> SmcController<M> {
        self.ctrl
    }
}

impl<M: Mmio> fmt::Debug for FlashBanks<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashBanks")
            .field("banks", &self.banks)
            .finish_non_exhaustive()
    }
}
