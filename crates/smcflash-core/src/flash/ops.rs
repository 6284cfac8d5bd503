//! Sector erase and buffer programming

use crate::error::{Error, Result};
use crate::mmio::Mmio;
use crate::opcodes::PAGE_SIZE;
use crate::smc::SmcController;

use super::bank::FlashBank;
use super::progress::{FlashProgress, NoProgress};

/// Outcome of [`flash_erase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EraseReport {
    /// Sectors erased
    pub erased: usize,
    /// Protected sectors skipped
    pub skipped: usize,
}

/// Erase sectors `first..=last` of a bank
///
/// The range is rejected without touching the part if `first` is
/// negative, `first > last`, or `last` is past the end of the bank.
/// Protected sectors inside the range are skipped. The controller is
/// returned to fast-read idle afterwards, also when an erase fails.
pub fn flash_erase<M: Mmio, P: FlashProgress>(
    ctrl: &mut SmcController<M>,
    bank: &FlashBank,
    first: i32,
    last: i32,
    progress: &mut P,
) -> Result<EraseReport> {
    if first < 0 || first > last || last as usize >= bank.sector_count() {
        log::error!("no sectors to erase (bank {}, {}..={})", bank.index(), first, last);
        return Err(Error::InvalidSectorRange { first, last });
    }
    let (first, last) = (first as usize, last as usize);

    let skipped = (first..=last).filter(|&s| bank.is_protected(s)).count();
    if skipped > 0 {
        log::warn!("{} protected sectors will not be erased", skipped);
    }

    progress.erasing(last - first + 1 - skipped);

    let mut report = EraseReport {
        erased: 0,
        skipped,
    };
    let result = erase_sectors(ctrl, bank, first, last, progress, &mut report);
    ctrl.reset(bank.timing().read, bank.dummy_bytes());
    result?;

    progress.complete();
    log::info!("Erased {} sectors, done", report.erased);
    Ok(report)
}

fn erase_sectors<M: Mmio, P: FlashProgress>(
    ctrl: &mut SmcController<M>,
    bank: &FlashBank,
    first: usize,
    last: usize,
    progress: &mut P,
    report: &mut EraseReport,
) -> Result<()> {
    for sector in first..=last {
        if bank.is_protected(sector) {
            continue;
        }
        let offset = sector as u32 * bank.sector_size();
        log::debug!("Erasing sector {} (offset 0x{:06X})", sector, offset);
        ctrl.sector_erase(bank.base(), bank.timing().erase, offset)?;
        report.erased += 1;
        progress.sector_erased(sector);
    }
    Ok(())
}

/// One page program issued by [`write_buff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Offset from the bank base
    pub offset: u32,
    /// Start index in the source buffer
    pub start: usize,
    /// Number of bytes
    pub len: usize,
}

/// Split `len` bytes at bank offset `offset` into page-sized programs
///
/// The first chunk ends at the next page boundary (or earlier if the
/// buffer does), every following chunk covers one full page except
/// possibly the last.
pub fn page_chunks(offset: u32, len: usize) -> PageChunks {
    PageChunks {
        offset,
        start: 0,
        remaining: len,
    }
}

/// Iterator returned by [`page_chunks`]
#[derive(Debug, Clone)]
pub struct PageChunks {
    offset: u32,
    start: usize,
    remaining: usize,
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<PageChunk> {
        if self.remaining == 0 {
            return None;
        }
        let to_boundary = PAGE_SIZE - (self.offset as usize % PAGE_SIZE);
        let len = self.remaining.min(to_boundary);
        let chunk = PageChunk {
            offset: self.offset,
            start: self.start,
            len,
        };
        self.offset = self.offset.wrapping_add(len as u32);
        self.start += len;
        self.remaining -= len;
        Some(chunk)
    }
}

/// Program `src` at absolute address `addr`
///
/// The target must already be erased. Protection flags are not consulted
/// here; see [`FlashBanks::write`](super::FlashBanks::write).
pub fn write_buff<M: Mmio>(
    ctrl: &mut SmcController<M>,
    bank: &FlashBank,
    src: &[u8],
    addr: u32,
) -> Result<()> {
    write_buff_with_progress(ctrl, bank, src, addr, &mut NoProgress)
}

/// [`write_buff`] with progress reporting
pub fn write_buff_with_progress<M: Mmio, P: FlashProgress>(
    ctrl: &mut SmcController<M>,
    bank: &FlashBank,
    src: &[u8],
    addr: u32,
    progress: &mut P,
) -> Result<()> {
    bank.check_range(addr, src.len())?;
    progress.writing(src.len());

    let mut written = 0;
    let mut result = Ok(());
    for chunk in page_chunks(addr - bank.base(), src.len()) {
        let data = &src[chunk.start..chunk.start + chunk.len];
        result = ctrl.page_program(bank.base(), bank.timing().write, chunk.offset, data);
        if result.is_err() {
            break;
        }
        written += chunk.len;
        progress.write_progress(written);
    }

    ctrl.reset(bank.timing().read, bank.dummy_bytes());
    result?;
    progress.complete();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn chunks(offset: u32, len: usize) -> Vec<(u32, usize, usize)> {
        page_chunks(offset, len)
            .map(|c| (c.offset, c.start, c.len))
            .collect()
    }

    #[test]
    fn test_chunks_aligned() {
        assert_eq!(
            chunks(0x100, 600),
            [(0x100, 0, 256), (0x200, 256, 256), (0x300, 512, 88)]
        );
    }

    #[test]
    fn test_chunks_cross_boundary() {
        // 16 bytes before the boundary, then the rest
        assert_eq!(chunks(0x0F0, 100), [(0x0F0, 0, 16), (0x100, 16, 84)]);
        assert_eq!(
            chunks(0x1FF, 258),
            [(0x1FF, 0, 1), (0x200, 1, 256), (0x300, 257, 1)]
        );
    }

    #[test]
    fn test_chunks_short_write_within_page() {
        assert_eq!(chunks(0x10, 5), [(0x10, 0, 5)]);
        assert_eq!(chunks(0x00, 256), [(0x00, 0, 256)]);
    }

    #[test]
    fn test_chunks_empty() {
        assert!(chunks(0x1234, 0).is_empty());
    }

    #[test]
    fn test_chunks_cover_buffer() {
        for offset in [0u32, 1, 0x7F, 0xFF, 0x100, 0x1_00F0] {
            for len in [1usize, 255, 256, 257, 1000] {
                let c = chunks(offset, len);
                assert_eq!(c.iter().map(|x| x.2).sum::<usize>(), len);
                for &(off, _, n) in &c {
                    assert!(n >= 1 && n <= PAGE_SIZE);
                    // No chunk crosses a page boundary
                    assert_eq!(off as usize / PAGE_SIZE, (off as usize + n - 1) / PAGE_SIZE);
                }
            }
        }
    }
}
