//! smcflash-dummy - Simulated SMC register file with an SPI NOR part behind it
//!
//! [`DummySmc`] implements [`Mmio`] the way the real controller behaves as
//! seen from the driver: the SPI control register, the SCU strapping
//! register and one flash data window. While the control register selects
//! user mode with chip select low, bytes written to the window are
//! collected as one SPI transaction and executed when chip select rises.
//! Outside user mode the window reads the flash contents linearly.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
mod options;

#[cfg(feature = "std")]
pub use options::{parse_options, DummyError};

use alloc::vec;
use alloc::vec::Vec;

use smcflash_core::chip::{JedecId, PartInfo};
use smcflash_core::opcodes::{self, Status, PAGE_SIZE};
use smcflash_core::regs::{DEFAULT_FLASH_BASE, SCU_HW_STRAPPING, SMC_SPI_CTRL};
use smcflash_core::smc::{BusMode, ChipSelect, ControlWord};
use smcflash_core::Mmio;

/// Configuration for the simulated board
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC ID the part answers with
    pub id: JedecId,
    /// Base address of the flash data window
    pub flash_base: u32,
    /// Flash size in bytes
    pub size: usize,
    /// Erase sector size in bytes
    pub sector_size: usize,
    /// SCU hardware strapping register value
    pub scu_strap: u32,
    /// Status register contents at power-up
    pub initial_status: u8,
    /// Status reads that report busy after each program, erase or status write
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            id: JedecId::from_bytes(0xEF, 0x30, 0x15), // W25X16
            flash_base: DEFAULT_FLASH_BASE,
            size: 2 * 1024 * 1024,
            sector_size: 64 * 1024,
            scu_strap: 0,
            initial_status: (Status::BP0 | Status::BP1 | Status::BP2).bits(),
            busy_polls: 2,
        }
    }
}

impl DummyConfig {
    /// Simulate a part from the table at `flash_base`
    pub fn for_part(part: &PartInfo, flash_base: u32) -> Self {
        Self {
            id: part.id,
            flash_base,
            size: part.size as usize,
            sector_size: part.sector_size as usize,
            ..Self::default()
        }
    }
}

/// One chip-select-low period in user mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Control register value that opened the transaction
    pub ctrl: u32,
    /// Bytes written to the data window, opcode first
    pub bytes: Vec<u8>,
}

impl Transaction {
    /// Command opcode, if any byte was sent
    pub fn opcode(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Clock divisor code in effect
    pub fn divisor(&self) -> u8 {
        ControlWord::from_bits(self.ctrl).divisor()
    }

    /// 24-bit big-endian address following the opcode
    pub fn address(&self) -> Option<u32> {
        match self.bytes.get(1..4)? {
            [a2, a1, a0] => Some((*a2 as u32) << 16 | (*a1 as u32) << 8 | *a0 as u32),
            _ => None,
        }
    }

    /// Bytes after opcode and address
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(4..).unwrap_or(&[])
    }
}

/// Simulated SMC with one SPI NOR part
pub struct DummySmc {
    config: DummyConfig,
    data: Vec<u8>,
    ctrl: u32,
    status: u8,
    write_enabled: bool,
    busy: u32,
    never_ready: bool,
    current: Option<Transaction>,
    log: Vec<Transaction>,
    elapsed_us: u64,
}

impl DummySmc {
    /// Create a simulated board with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let status = config.initial_status & !(Status::WIP | Status::WEL).bits();
        Self {
            config,
            data,
            ctrl: ControlWord::fast_read_idle(0, 1).bits(),
            status,
            write_enabled: false,
            busy: 0,
            never_ready: false,
            current: None,
            log: Vec::new(),
            elapsed_us: 0,
        }
    }

    /// Create a simulated W25X16 at the default flash base
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a simulated board with pre-filled flash
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut smc = Self::new(config);
        let len = core::cmp::min(initial_data.len(), smc.data.len());
        smc.data[..len].copy_from_slice(&initial_data[..len]);
        smc
    }

    /// Flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable flash contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current SPI control register value
    pub fn control(&self) -> u32 {
        self.ctrl
    }

    /// Non-volatile status register bits
    pub fn status(&self) -> u8 {
        self.status
    }

    /// True while a user-mode transaction is open
    pub fn is_selected(&self) -> bool {
        self.current.is_some()
    }

    /// Make the part report busy forever
    pub fn set_never_ready(&mut self, never_ready: bool) {
        self.never_ready = never_ready;
    }

    /// Completed transactions, oldest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Forget completed transactions
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// `(offset, length)` of every page program executed
    pub fn page_programs(&self) -> Vec<(u32, usize)> {
        self.log
            .iter()
            .filter(|t| t.opcode() == Some(opcodes::PP))
            .filter_map(|t| Some((t.address()?, t.payload().len())))
            .collect()
    }

    /// Offsets of every sector erase executed
    pub fn erased_sectors(&self) -> Vec<u32> {
        self.log
            .iter()
            .filter(|t| t.opcode() == Some(opcodes::SE_D8))
            .filter_map(Transaction::address)
            .collect()
    }

    /// Sum of all requested delays
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn window_offset(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.config.flash_base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }

    fn read_status(&mut self) -> u8 {
        let mut status = Status::from_bits_retain(self.status);
        if self.write_enabled {
            status |= Status::WEL;
        }
        if self.never_ready {
            status |= Status::WIP;
        } else if self.busy > 0 {
            self.busy -= 1;
            status |= Status::WIP;
        }
        status.bits()
    }

    fn set_control(&mut self, value: u32) {
        self.ctrl = value;
        let word = ControlWord::from_bits(value);
        let selected = word.mode() == BusMode::User && word.chip_select() == ChipSelect::Low;

        if selected && self.current.is_none() {
            self.current = Some(Transaction {
                ctrl: value,
                bytes: Vec::new(),
            });
        } else if !selected {
            if let Some(txn) = self.current.take() {
                self.execute(&txn);
                self.log.push(txn);
            }
        }
    }

    fn execute(&mut self, txn: &Transaction) {
        let Some(opcode) = txn.opcode() else {
            return;
        };

        match opcode {
            opcodes::WREN => self.write_enabled = true,
            opcodes::RDSR | opcodes::RDID => {}
            opcodes::WRSR => {
                if !self.take_write_enable(opcode) {
                    return;
                }
                if let Some(&value) = txn.bytes.get(1) {
                    self.status = value & !(Status::WIP | Status::WEL).bits();
                }
            }
            opcodes::PP => {
                if !self.take_write_enable(opcode) {
                    return;
                }
                let Some(addr) = txn.address() else {
                    return;
                };
                self.program(addr as usize, txn.payload());
            }
            opcodes::SE_D8 => {
                if !self.take_write_enable(opcode) {
                    return;
                }
                let Some(addr) = txn.address() else {
                    return;
                };
                let start = addr as usize / self.config.sector_size * self.config.sector_size;
                let end = (start + self.config.sector_size).min(self.data.len());
                if start < end {
                    self.data[start..end].fill(0xFF);
                }
            }
            _ => log::debug!("dummy: ignoring opcode 0x{:02X}", opcode),
        }
    }

    /// Consume the write enable latch and start the busy period
    fn take_write_enable(&mut self, opcode: u8) -> bool {
        if !self.write_enabled {
            log::warn!("dummy: opcode 0x{:02X} without write enable", opcode);
            return false;
        }
        self.write_enabled = false;
        self.busy = self.config.busy_polls;
        true
    }

    /// Page program wraps within the page like a real part
    fn program(&mut self, addr: usize, payload: &[u8]) {
        let page = addr & !(PAGE_SIZE - 1);
        for (i, &byte) in payload.iter().enumerate() {
            let target = page + ((addr + i) & (PAGE_SIZE - 1));
            if let Some(cell) = self.data.get_mut(target) {
                *cell &= byte;
            }
        }
    }
}

impl Mmio for DummySmc {
    fn read8(&mut self, addr: u32) -> u8 {
        let offset = self.window_offset(addr);
        if let Some(txn) = &self.current {
            let polling = offset.is_some() && txn.bytes == [opcodes::RDSR];
            return if polling { self.read_status() } else { 0xFF };
        }
        match offset {
            Some(offset) => self.data[offset],
            None => {
                log::warn!("dummy: read8 from unmapped address 0x{:08X}", addr);
                0xFF
            }
        }
    }

    fn read32(&mut self, addr: u32) -> u32 {
        match addr {
            SMC_SPI_CTRL => return self.ctrl,
            SCU_HW_STRAPPING => return self.config.scu_strap,
            _ => {}
        }

        let offset = self.window_offset(addr);
        match (&self.current, offset) {
            (Some(txn), Some(_)) if txn.bytes == [opcodes::RDID] => {
                // The fourth clocked byte wraps to the manufacturer ID
                let id = self.config.id;
                id.raw() | (id.manufacturer() as u32) << 24
            }
            (Some(_), _) => 0xFFFF_FFFF,
            (None, Some(offset)) if offset + 4 <= self.data.len() => u32::from_le_bytes([
                self.data[offset],
                self.data[offset + 1],
                self.data[offset + 2],
                self.data[offset + 3],
            ]),
            _ => {
                log::warn!("dummy: read32 from unmapped address 0x{:08X}", addr);
                0xFFFF_FFFF
            }
        }
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match self.current.as_mut() {
            Some(txn) => txn.bytes.push(value),
            None => log::warn!(
                "dummy: write8 0x{:02X} to 0x{:08X} outside user mode ignored",
                value,
                addr
            ),
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        if addr == SMC_SPI_CTRL {
            self.set_control(value);
        } else {
            log::warn!("dummy: write32 0x{:08X} to 0x{:08X} ignored", value, addr);
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smcflash_core::board::{BoardConfig, Region};
    use smcflash_core::chip::find_part_by_name;
    use smcflash_core::flash::{
        flash_erase, write_buff, EraseReport, FlashBank, FlashBanks, FlashProgress, NoProgress,
    };
    use smcflash_core::smc::{SmcController, Timing};
    use smcflash_core::Error;

    fn at_zero() -> DummyConfig {
        DummyConfig {
            flash_base: 0,
            ..DummyConfig::default()
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 13 + (i >> 8)) as u8).collect()
    }

    fn identified(config: DummyConfig) -> (SmcController<DummySmc>, FlashBank) {
        let base = config.flash_base;
        let mut ctrl = SmcController::new(DummySmc::new(config));
        let bank = FlashBank::identify(&mut ctrl, base, 0).unwrap();
        (ctrl, bank)
    }

    fn opcodes_of(smc: &DummySmc) -> Vec<u8> {
        smc.transactions().iter().filter_map(Transaction::opcode).collect()
    }

    #[derive(Default)]
    struct Recorder {
        planned: usize,
        erased: Vec<usize>,
        written: Vec<usize>,
        completed: bool,
    }

    impl FlashProgress for Recorder {
        fn erasing(&mut self, sectors_to_erase: usize) {
            self.planned = sectors_to_erase;
        }
        fn sector_erased(&mut self, sector: usize) {
            self.erased.push(sector);
        }
        fn writing(&mut self, _bytes_to_write: usize) {}
        fn write_progress(&mut self, bytes_written: usize) {
            self.written.push(bytes_written);
        }
        fn complete(&mut self) {
            self.completed = true;
        }
    }

    #[test]
    fn test_identify_w25x16() {
        let (ctrl, bank) = identified(at_zero());

        assert_eq!(bank.id().raw(), 0x1530ef);
        assert_eq!(bank.name(), "W25X16");
        assert_eq!(bank.sector_count(), 32);
        assert_eq!(bank.size(), 0x20_0000);
        assert_eq!(bank.sector_size(), 0x1_0000);
        for i in 0..32 {
            assert_eq!(bank.sector_start(i), Some(i as u32 * 0x1_0000));
            assert!(!bank.is_protected(i));
        }

        // 266 MHz core clock against 50/25/50 MHz ceilings
        assert_eq!(
            bank.timing(),
            Timing {
                write: 5,
                erase: 2,
                read: 5
            }
        );

        let smc = ctrl.mmio();
        assert_eq!(smc.status(), 0, "block protect bits cleared");
        assert_eq!(
            opcodes_of(smc),
            [
                opcodes::RDID,
                opcodes::WREN,
                opcodes::RDSR,
                opcodes::WRSR,
                opcodes::RDSR
            ]
        );
        assert_eq!(smc.transactions()[3].bytes, [opcodes::WRSR, 0x00]);
        assert_eq!(smc.transactions()[4].divisor(), 0);
        assert_eq!(smc.control(), ControlWord::fast_read_idle(5, 1).bits());
        assert!(!smc.is_selected());
    }

    #[test]
    fn test_identify_calibrates_from_strap() {
        let part = find_part_by_name("M25P64").unwrap();
        let mut config = DummyConfig::for_part(part, 0);
        config.scu_strap = 0x1000; // 266 MHz / 2
        let (_ctrl, bank) = identified(config);
        assert_eq!(bank.sector_count(), 128);
        assert_eq!(
            bank.timing(),
            Timing {
                write: 6,
                erase: 4,
                read: 6
            }
        );
    }

    #[test]
    fn test_identify_every_known_part() {
        for part in smcflash_core::chip::PARTS {
            let (_ctrl, bank) = identified(DummyConfig::for_part(part, 0x1400_0000));
            assert_eq!(bank.sector_count(), part.sector_count as usize, "{}", part.name);
            assert_eq!(bank.size(), part.size, "{}", part.name);
            assert_eq!(bank.sector_size(), part.sector_size, "{}", part.name);
        }
    }

    #[test]
    fn test_identify_unknown_part() {
        let config = DummyConfig {
            id: JedecId::from_word(0x123456),
            ..at_zero()
        };
        let (ctrl, bank) = identified(config);

        assert!(!bank.is_present());
        assert_eq!(bank.size(), 0);
        assert_eq!(bank.sector_count(), 0);

        // No status write, but still back to idle with default clocks
        let smc = ctrl.mmio();
        assert_eq!(opcodes_of(smc), [opcodes::RDID]);
        assert_ne!(smc.status(), 0);
        assert_eq!(smc.control(), ControlWord::fast_read_idle(4, 1).bits());
    }

    #[test]
    fn test_erase_skips_protected() {
        let config = at_zero();
        let size = config.size;
        let mut ctrl = SmcController::new(DummySmc::with_data(config, &vec![0x00; size]));
        let mut bank = FlashBank::identify(&mut ctrl, 0, 0).unwrap();
        bank.set_protected(5, true);
        ctrl.mmio_mut().clear_log();

        let mut progress = Recorder::default();
        let report = flash_erase(&mut ctrl, &bank, 0, 31, &mut progress).unwrap();
        assert_eq!(
            report,
            EraseReport {
                erased: 31,
                skipped: 1
            }
        );
        assert_eq!(progress.planned, 31);
        assert_eq!(progress.erased.len(), 31);
        assert!(!progress.erased.contains(&5));
        assert!(progress.completed);

        let smc = ctrl.mmio();
        let erased = smc.erased_sectors();
        assert_eq!(erased.len(), 31);
        assert!(!erased.contains(&0x5_0000));
        assert!(smc
            .transactions()
            .iter()
            .filter(|t| t.opcode() == Some(opcodes::SE_D8))
            .all(|t| t.divisor() == bank.timing().erase));

        assert!(smc.data()[0x5_0000..0x6_0000].iter().all(|&b| b == 0x00));
        assert!(smc.data()[..0x5_0000].iter().all(|&b| b == 0xFF));
        assert!(smc.data()[0x6_0000..].iter().all(|&b| b == 0xFF));
        assert_eq!(smc.control(), ControlWord::fast_read_idle(5, 1).bits());
    }

    #[test]
    fn test_erase_invalid_range() {
        let (mut ctrl, bank) = identified(at_zero());
        ctrl.mmio_mut().clear_log();
        let before = ctrl.mmio().elapsed_us();

        for (first, last) in [(3, 1), (-1, 4), (0, 32), (-5, -1)] {
            let err = flash_erase(&mut ctrl, &bank, first, last, &mut NoProgress).unwrap_err();
            assert_eq!(err, Error::InvalidSectorRange { first, last });
            assert_eq!(err.status_code(), 1);
        }

        assert!(ctrl.mmio().transactions().is_empty());
        assert_eq!(ctrl.mmio().elapsed_us(), before);
    }

    #[test]
    fn test_erase_all_protected_still_resets() {
        let (mut ctrl, mut bank) = identified(at_zero());
        bank.set_protected(5, true);
        ctrl.mmio_mut().clear_log();
        let before = ctrl.mmio().elapsed_us();

        let report = flash_erase(&mut ctrl, &bank, 5, 5, &mut NoProgress).unwrap();
        assert_eq!(
            report,
            EraseReport {
                erased: 0,
                skipped: 1
            }
        );
        assert!(ctrl.mmio().transactions().is_empty());
        // Exactly one control write: the reset
        assert_eq!(ctrl.mmio().elapsed_us() - before, 100);
        assert_eq!(ctrl.mmio().control(), ControlWord::fast_read_idle(5, 1).bits());
    }

    #[test]
    fn test_write_buff_page_chunks() {
        let (mut ctrl, bank) = identified(at_zero());
        ctrl.mmio_mut().clear_log();

        let src = pattern(300);
        write_buff(&mut ctrl, &bank, &src, 0xF0).unwrap();

        let smc = ctrl.mmio();
        assert_eq!(smc.page_programs(), [(0xF0, 16), (0x100, 256), (0x200, 28)]);
        let first_pp = smc
            .transactions()
            .iter()
            .find(|t| t.opcode() == Some(opcodes::PP))
            .unwrap();
        assert_eq!(first_pp.bytes[..4], [opcodes::PP, 0x00, 0x00, 0xF0]);
        assert_eq!(first_pp.divisor(), bank.timing().write);

        assert_eq!(&smc.data()[0xF0..0xF0 + 300], &src[..]);
        assert!(smc.data()[..0xF0].iter().all(|&b| b == 0xFF));
        assert!(smc.data()[0xF0 + 300..0x400].iter().all(|&b| b == 0xFF));
        assert_eq!(smc.control(), ControlWord::fast_read_idle(5, 1).bits());
    }

    #[test]
    fn test_write_buff_out_of_bounds() {
        let (mut ctrl, bank) = identified(at_zero());
        ctrl.mmio_mut().clear_log();
        let err = write_buff(&mut ctrl, &bank, &[0u8; 2], 0x1F_FFFF).unwrap_err();
        assert_eq!(err, Error::AddressOutOfBounds);
        assert!(ctrl.mmio().transactions().is_empty());
    }

    #[test]
    fn test_read_back_lengths() {
        let config = DummyConfig::default();
        let base = config.flash_base;
        let contents = pattern(config.size);
        let smc = DummySmc::with_data(config, &contents);
        let mut banks = FlashBanks::init(SmcController::new(smc), &BoardConfig::default()).unwrap();

        for (offset, len) in [(0usize, 1usize), (0, 3), (0, 4), (0, 5), (1, 3), (2, 7), (0x1234, 1003)] {
            let mut buf = vec![0u8; len];
            banks.read(base + offset as u32, &mut buf).unwrap();
            assert_eq!(buf, contents[offset..offset + len], "offset {} len {}", offset, len);
        }
    }

    #[test]
    fn test_init_protects_board_regions() {
        let mut config = BoardConfig::single_bank(0);
        config.monitor = Some(Region::new(0, 0x4_0000));
        config.env = Some(Region::new(0x6_0000, 0x1_0000));
        config.env_redundant = Some(Region::new(0x7_0000, 0x1_0000));

        let mut banks = FlashBanks::init(SmcController::new(DummySmc::new(at_zero())), &config).unwrap();
        assert_eq!(banks.total_size(), 0x20_0000);

        let bank = banks.bank(0).unwrap();
        let protected: Vec<usize> = bank.sectors().filter(|s| s.protected).map(|s| s.index).collect();
        assert_eq!(protected, [0, 1, 2, 3, 6, 7]);

        let data = [0x5A; 16];
        assert_eq!(
            banks.write(0x6_0010, &data, &mut NoProgress),
            Err(Error::RegionProtected { sector: 6 })
        );
        assert_eq!(
            banks.write(0x5_FFF8, &data, &mut NoProgress),
            Err(Error::RegionProtected { sector: 6 })
        );
        assert_eq!(
            banks.write(0x1F_FFFF, &data, &mut NoProgress),
            Err(Error::AddressOutOfBounds)
        );
        assert_eq!(
            banks.write(0x20_0000, &data, &mut NoProgress),
            Err(Error::NoBankAtAddress { addr: 0x20_0000 })
        );
        banks.write(0x5_0000, &data, &mut NoProgress).unwrap();

        assert_eq!(banks.protect(false, 0x6_0000, 0x6_FFFF), Ok(1));
        let mut progress = Recorder::default();
        banks.write(0x6_0010, &data, &mut progress).unwrap();
        assert_eq!(progress.written, [16]);

        let mut buf = [0u8; 16];
        banks.read(0x6_0010, &mut buf).unwrap();
        assert_eq!(buf, data);

        // Erase of the whole bank leaves the monitor alone
        let report = banks.erase(0, 0, 31, &mut NoProgress).unwrap();
        assert_eq!(report.skipped, 5);
        assert_eq!(report.erased, 27);
    }

    #[test]
    fn test_second_bank_without_part() {
        let mut config = BoardConfig::single_bank(0);
        config.banks.push(0x0100_0000).unwrap();

        let mut banks = FlashBanks::init(SmcController::new(DummySmc::new(at_zero())), &config).unwrap();
        assert_eq!(banks.banks().len(), 2);
        assert!(banks.bank(0).unwrap().is_present());
        assert!(!banks.bank(1).unwrap().is_present());
        assert_eq!(banks.total_size(), 0x20_0000);

        assert_eq!(banks.find_bank(0x1F_FFFF).map(|b| b.index()), Some(0));
        assert!(banks.find_bank(0x0100_0000).is_none());

        assert!(matches!(
            banks.erase(1, 0, 0, &mut NoProgress),
            Err(Error::UnknownPart { .. })
        ));
        assert_eq!(banks.erase(2, 0, 0, &mut NoProgress), Err(Error::BankNotPresent));
    }

    #[test]
    fn test_never_ready_times_out() {
        let mut config = BoardConfig::single_bank(0);
        config.poll_limit = Some(1000);
        let mut banks = FlashBanks::init(SmcController::new(DummySmc::new(at_zero())), &config).unwrap();

        banks.controller_mut().mmio_mut().set_never_ready(true);
        assert_eq!(
            banks.write(0x100, &[0x00; 4], &mut NoProgress),
            Err(Error::Timeout)
        );
        assert_eq!(
            banks.erase(0, 1, 1, &mut NoProgress),
            Err(Error::Timeout)
        );

        let smc = banks.controller_mut().mmio();
        assert!(!smc.is_selected());
        assert_eq!(smc.control(), ControlWord::fast_read_idle(5, 1).bits());
    }
}
