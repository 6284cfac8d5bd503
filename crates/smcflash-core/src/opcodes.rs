//! SPI NOR opcodes and status register bits used by the driver
//!
//! Only the single-I/O 3-byte-address command set the SMC user mode path
//! needs is listed here.

use bitflags::bitflags;

/// Write Status Register
pub const WRSR: u8 = 0x01;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Read Data (memory-mapped normal read mode)
pub const READ: u8 = 0x03;
/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Enable
pub const WREN: u8 = 0x06;
/// Fast Read (memory-mapped fast read mode)
pub const FAST_READ: u8 = 0x0B;
/// Read JEDEC ID
pub const RDID: u8 = 0x9F;
/// 64 KiB block erase, used as the sector erase for every supported part
pub const SE_D8: u8 = 0xD8;

/// Page size for Page Program
pub const PAGE_SIZE: usize = 256;

bitflags! {
    /// Status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Write In Progress
        const WIP  = 0x01;
        /// Write Enable Latch
        const WEL  = 0x02;
        /// Block Protect 0
        const BP0  = 0x04;
        /// Block Protect 1
        const BP1  = 0x08;
        /// Block Protect 2
        const BP2  = 0x10;
        /// Status Register Write Disable
        const SRWD = 0x80;
    }
}
