//! Reads through the memory-mapped fast-read window
//!
//! In fast-read idle the controller maps the whole part linearly at the
//! bank base, so reads are plain loads. Whole words are fetched with
//! 32-bit loads and stored little-endian, the unaligned head and the tail
//! go byte by byte.

use crate::error::Result;
use crate::mmio::Mmio;
use crate::smc::SmcController;

use super::bank::FlashBank;

/// Copy `dest.len()` bytes starting at absolute address `src`
pub fn read_buff<M: Mmio>(
    ctrl: &mut SmcController<M>,
    bank: &FlashBank,
    src: u32,
    dest: &mut [u8],
) -> Result<()> {
    bank.check_range(src, dest.len())?;
    let mmio = ctrl.mmio_mut();

    let mut addr = src;
    let head = ((4 - (src % 4) as usize) % 4).min(dest.len());
    let (head_buf, rest) = dest.split_at_mut(head);
    for byte in head_buf.iter_mut() {
        *byte = mmio.read8(addr);
        addr += 1;
    }

    let mut words = rest.chunks_exact_mut(4);
    for word in &mut words {
        word.copy_from_slice(&mmio.read32(addr).to_le_bytes());
        addr += 4;
    }

    for byte in words.into_remainder() {
        *byte = mmio.read8(addr);
        addr += 1;
    }

    Ok(())
}

/// Read one byte from the mapped window
pub fn read_uchar<M: Mmio>(ctrl: &mut SmcController<M>, addr: u32) -> u8 {
    ctrl.mmio_mut().read8(addr)
}

/// Read a little-endian halfword byte by byte
pub fn read_ushort<M: Mmio>(ctrl: &mut SmcController<M>, addr: u32) -> u16 {
    let mmio = ctrl.mmio_mut();
    let b0 = mmio.read8(addr) as u16;
    let b1 = mmio.read8(addr + 1) as u16;
    (b1 << 8) | b0
}

/// Read a word byte by byte, halfwords swapped
///
/// Bytes `b0 b1 b2 b3` come back as `b1 b0 b3 b2` from most to least
/// significant, which is the layout the bootloader's generic CFI code
/// expects from this driver.
pub fn read_long<M: Mmio>(ctrl: &mut SmcController<M>, addr: u32) -> u32 {
    let mmio = ctrl.mmio_mut();
    let b0 = mmio.read8(addr) as u32;
    let b1 = mmio.read8(addr + 1) as u32;
    let b2 = mmio.read8(addr + 2) as u32;
    let b3 = mmio.read8(addr + 3) as u32;
    (b0 << 16) | (b1 << 24) | b2 | (b3 << 8)
}
