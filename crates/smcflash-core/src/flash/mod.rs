//! Bank and sector level flash operations
//!
//! [`FlashBank`] describes the part found at one data window. The free
//! functions operate on a single bank; [`FlashBanks`] ties the banks of a
//! board together with their controller.

mod bank;
mod banks;
mod mapped;
mod ops;
mod progress;

use core::fmt;

pub use bank::{FlashBank, Sector};
pub use banks::FlashBanks;
pub use mapped::{read_buff, read_long, read_uchar, read_ushort};
pub use ops::{
    flash_erase, page_chunks, write_buff, write_buff_with_progress, EraseReport, PageChunk,
    PageChunks,
};
pub use progress::{FlashProgress, NoProgress};

/// Bank information hook of the generic flash layer
///
/// This driver has nothing to add and prints a blank line.
pub fn flash_print_info<W: fmt::Write>(_bank: &FlashBank, out: &mut W) -> fmt::Result {
    out.write_str("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::find_part_by_name;
    use crate::smc::Timing;
    use alloc::string::String;

    #[test]
    fn test_print_info_blank_line() {
        let part = find_part_by_name("M25P64").unwrap();
        let bank = FlashBank::new(0, 0, part.id, Some(part), Timing::default());
        let mut out = String::new();
        flash_print_info(&bank, &mut out).unwrap();
        assert_eq!(out, "\n");
    }
}
